use std::time::{SystemTime, UNIX_EPOCH};

const SECONDS_PER_DAY: u64 = 86_400;

/// The time metadata kept for every inode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeMetadata {
    /// Last access time.
    pub atime: SystemTime,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Creation time.
    pub crtime: SystemTime,
}

impl TimeMetadata {
    /// All three timestamps set to the current time.
    pub fn now() -> Self {
        let now = SystemTime::now();

        Self {
            atime: now,
            mtime: now,
            crtime: now,
        }
    }

    pub fn touch_accessed(&mut self) {
        self.atime = SystemTime::now();
    }

    /// A modification counts as an access too.
    pub fn touch_modified(&mut self) {
        self.mtime = SystemTime::now();
        self.atime = self.mtime;
    }
}

impl Default for TimeMetadata {
    fn default() -> Self {
        Self {
            atime: UNIX_EPOCH,
            mtime: UNIX_EPOCH,
            crtime: UNIX_EPOCH,
        }
    }
}

/// The ownership metadata kept for every inode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OwnershipMetadata {
    /// Owner user ID.
    pub uid: u32,
    /// Owner group ID.
    pub gid: u32,
}

/// Renders `time` as `YYYY-MM-DD HH:MM:SS` in UTC. Times before the epoch render as the epoch.
pub fn format_timestamp(time: SystemTime) -> String {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let (year, month, day) = civil_from_days((secs / SECONDS_PER_DAY) as i64);
    let secs_of_day = secs % SECONDS_PER_DAY;

    format!(
        "{year:04}-{month:02}-{day:02} {:02}:{:02}:{:02}",
        secs_of_day / 3600,
        (secs_of_day / 60) % 60,
        secs_of_day % 60
    )
}

/// Converts days since 1970-01-01 to a proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    // eras are 400-year cycles starting on 0000-03-01
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);

    (year, month, day)
}
