use anyhow::{Context, Result};
use clap::Parser;

use minifs::config::{DEFAULT_LABEL, MAX_BLOCKS, MAX_INODES};
use minifs::{Config, FileSystem, ROOT_INODE};

const README: &str = "# MiniOS v2.0\n\nWelcome to MiniOS Enhanced!\n\n\
    This is an advanced educational operating system.\n\n\
    Features:\n- Memory Management\n- Process Scheduling\n- Filesystem\n- Network Stack\n";

const CONFIG_SYS: &str = "# MiniOS Configuration\n\
    KERNEL_MODE=protected\n\
    MEMORY_SIZE=256MB\n\
    FILESYSTEM=ext2\n\
    DEVICE_DRIVERS=keyboard,disk,timer,rtc\n";

const BOOT_SH: &str = "#!/bin/sh\n\
    echo \"Booting MiniOS...\"\n\
    init_drivers\n\
    mount_filesystem /\n\
    start_services\n";

/// Builds a small directory tree in memory and walks through the filesystem operations.
#[derive(Parser)]
struct Args {
    /// Maximum number of inodes
    #[arg(long, default_value_t = MAX_INODES)]
    max_inodes: usize,
    /// Maximum number of data blocks
    #[arg(long, default_value_t = MAX_BLOCKS)]
    max_blocks: usize,
    /// Filesystem label
    #[arg(long, default_value = DEFAULT_LABEL)]
    label: String,
    /// Check the filesystem for consistency before exiting
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = Config {
        max_inodes: args.max_inodes,
        max_blocks: args.max_blocks,
        label: args.label,
    };

    let mut fs = FileSystem::with_config(config).context("unable to create filesystem")?;

    println!("Creating directory structure...");
    for name in ["bin", "etc", "home", "usr", "dev", "tmp"] {
        fs.create_directory(name, ROOT_INODE)
            .with_context(|| format!("creating /{name}"))?;
    }

    let etc = fs.find_file("/etc")?;
    let home = fs.find_file("/home")?;
    let usr = fs.find_file("/usr")?;
    fs.create_directory("bin", usr)?;
    fs.create_directory("lib", usr)?;
    let home_user = fs.create_directory("user", home)?;

    println!("Creating files...");
    let readme = write_new_file(&mut fs, "README.md", ROOT_INODE, README)?;
    write_new_file(&mut fs, "config.sys", etc, CONFIG_SYS)?;
    write_new_file(&mut fs, "boot.sh", etc, BOOT_SH)?;

    println!("\nListing root directory:");
    print!("{}", fs.list_directory(ROOT_INODE)?);

    println!("\nListing /etc directory:");
    print!("{}", fs.list_directory(etc)?);

    println!("\nReading README.md:");
    let data = fs.read_file(readme).context("reading README.md")?;
    println!("{}", String::from_utf8_lossy(&data));

    println!("Copying README.md to /home/user/");
    fs.copy_file(readme, home_user, "README_copy.md")
        .context("copying README.md")?;

    println!("\nListing /home/user:");
    print!("{}", fs.list_directory(home_user)?);

    println!("\n{}", fs.stats());

    println!("\nStarting defragmentation...");
    let blocks = fs.defragment();
    println!("Defragmentation complete. Blocks compacted to {blocks}");

    if args.check {
        fs.check().context("filesystem check failed")?;
        println!("Filesystem is consistent");
    }

    Ok(())
}

fn write_new_file(
    fs: &mut FileSystem,
    name: &str,
    parent: minifs::InodeNumber,
    contents: &str,
) -> Result<minifs::InodeNumber> {
    let inum = fs
        .create_file(name, parent)
        .with_context(|| format!("creating {name}"))?;
    fs.write_file(inum, contents.as_bytes())
        .with_context(|| format!("writing {name}"))?;

    Ok(inum)
}
