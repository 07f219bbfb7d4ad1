//! ディレクトリエントリ
//!
//! 一つのメンバーの構造化表現と、固定幅テキスト行との相互変換。
//!
//! 行レイアウト（文字オフセット、0始まり）:
//!
//! ```text
//! 0        選択マーカー（'*' / ' '）
//! 2..12    モード文字列
//! 13..21   所有ユーザー名（左詰め8文字）
//! 22..30   所有グループ名（左詰め8文字）
//! 31..39   サイズ（右詰め8文字）
//! 40..42   月
//! 43..45   日
//! 46..48   時
//! 49..51   分
//! 52..     ファイル名（行末まで）
//! ```
//!
//! 解析は区切り文字ではなく絶対オフセットに依存する。
//! オフセットは文字単位で数えるため、ASCII 以外の所有者名でも列はずれない。

use super::mode::{mode_string, MODE_WIDTH};
use crate::error::FormatError;
use crate::file::io::RawStat;
use crate::file::path::normalize_path;
use crate::identity::IdentityResolver;
use chrono::{DateTime, Datelike, Local, NaiveDate, Timelike};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const MODE_RANGE: Range<usize> = 2..12;
const OWNER_RANGE: Range<usize> = 13..21;
const GROUP_RANGE: Range<usize> = 22..30;
const SIZE_RANGE: Range<usize> = 31..39;
const MONTH_RANGE: Range<usize> = 40..42;
const DAY_RANGE: Range<usize> = 43..45;
const HOUR_RANGE: Range<usize> = 46..48;
const MINUTE_RANGE: Range<usize> = 49..51;

/// ファイル名の開始列
pub const NAME_COLUMN: usize = 52;
/// 所有者名・グループ名の幅
pub const ID_WIDTH: usize = 8;
/// サイズ欄の幅
pub const SIZE_WIDTH: usize = 8;

/// サイズ欄に収まらない値に付ける単位（1024 倍ずつ）
const SIZE_UNITS: [char; 5] = ['K', 'M', 'G', 'T', 'P'];

/// エントリ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    Other,
}

impl EntryKind {
    /// モード文字列の先頭文字から判定
    pub fn from_mode_char(c: Option<char>) -> Self {
        match c {
            Some('d') => EntryKind::Directory,
            Some('-') => EntryKind::File,
            _ => EntryKind::Other,
        }
    }
}

/// 切り詰められた更新時刻（年は保持しない）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifiedAt {
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl ModifiedAt {
    pub fn new(month: u8, day: u8, hour: u8, minute: u8) -> Self {
        Self {
            month,
            day,
            hour,
            minute,
        }
    }

    /// ローカル時刻の月・日（暦日）・時・分に切り詰める
    ///
    /// chrono で表せない時刻（年が範囲外）は `None`
    pub fn from_system_time(time: SystemTime) -> Option<Self> {
        let utc = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => {
                DateTime::from_timestamp(i64::try_from(after.as_secs()).ok()?, after.subsec_nanos())?
            }
            Err(e) => {
                let before = e.duration();
                let secs = i64::try_from(before.as_secs()).ok()?;
                match before.subsec_nanos() {
                    0 => DateTime::from_timestamp(secs.checked_neg()?, 0)?,
                    nanos => DateTime::from_timestamp(
                        secs.checked_neg()?.checked_sub(1)?,
                        1_000_000_000 - nanos,
                    )?,
                }
            }
        };
        // 境界の年ではローカル時差を足すと範囲外になる
        if utc.year() <= NaiveDate::MIN.year() || utc.year() >= NaiveDate::MAX.year() {
            return None;
        }
        let local = utc.with_timezone(&Local);
        Some(Self {
            month: local.month() as u8,
            day: local.day() as u8,
            hour: local.hour() as u8,
            minute: local.minute() as u8,
        })
    }
}

/// ディレクトリの一メンバー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    directory: PathBuf,
    name: String,
    kind: EntryKind,
    owner: String,
    group: String,
    size: u64,
    modified: ModifiedAt,
    mode: String,
    selected: bool,
}

impl Entry {
    /// 各欄から構築。種別はモード文字列の先頭文字から決まる
    pub fn new(
        directory: impl Into<PathBuf>,
        name: impl Into<String>,
        mode: impl Into<String>,
        owner: impl Into<String>,
        group: impl Into<String>,
        size: u64,
        modified: ModifiedAt,
    ) -> Self {
        let mode = mode.into();
        Self {
            directory: directory.into(),
            name: name.into(),
            kind: EntryKind::from_mode_char(mode.chars().next()),
            owner: owner.into(),
            group: group.into(),
            size,
            modified,
            mode,
            selected: false,
        }
    }

    /// stat 結果から構築
    ///
    /// 更新時刻を暦に変換できなければ `None`
    pub fn from_stat(
        directory: &Path,
        name: &str,
        stat: &RawStat,
        resolver: &IdentityResolver,
    ) -> Option<Self> {
        let modified = ModifiedAt::from_system_time(stat.modified)?;
        Some(Self::new(
            directory,
            name,
            mode_string(stat.mode),
            resolver.username(stat.uid).unwrap_or_default(),
            resolver.groupname(stat.gid).unwrap_or_default(),
            stat.size,
            modified,
        ))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn modified(&self) -> ModifiedAt {
        self.modified
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn toggle_selected(&mut self) {
        self.selected = !self.selected;
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// `.` または `..`
    pub fn is_dot(&self) -> bool {
        self.name == "." || self.name == ".."
    }

    /// エントリの絶対パス（`.` / `..` は解決済み）
    pub fn path(&self) -> PathBuf {
        normalize_path(self.directory.join(&self.name))
    }

    /// 一行に整形
    pub fn format(&self) -> String {
        let marker = if self.selected { '*' } else { ' ' };
        format!(
            "{} {} {} {} {} {:02} {:02} {:02}:{:02} {}",
            marker,
            fit(&self.mode, MODE_WIDTH),
            fit(&self.owner, ID_WIDTH),
            fit(&self.group, ID_WIDTH),
            format_size(self.size),
            self.modified.month,
            self.modified.day,
            self.modified.hour,
            self.modified.minute,
            self.name
        )
    }

    /// 一行を解析（ファイルシステムには触れない）
    ///
    /// ファイル名は52列目から行末までをそのまま使い、空白も削らない
    pub fn parse(directory: &Path, line: &str) -> Result<Self, FormatError> {
        let chars: Vec<char> = line.chars().collect();
        if chars.len() < NAME_COLUMN {
            return Err(FormatError::LineTooShort {
                length: chars.len(),
            });
        }
        if chars.len() == NAME_COLUMN {
            return Err(FormatError::EmptyName);
        }

        let field = |range: Range<usize>| chars[range].iter().collect::<String>();

        let mode = field(MODE_RANGE);
        let month = parse_number("month", &field(MONTH_RANGE), 1..=12)?;
        let day = parse_number("day", &field(DAY_RANGE), 1..=31)?;
        let hour = parse_number("hour", &field(HOUR_RANGE), 0..=23)?;
        let minute = parse_number("minute", &field(MINUTE_RANGE), 0..=59)?;

        let mut entry = Self::new(
            directory,
            chars[NAME_COLUMN..].iter().collect::<String>(),
            mode,
            field(OWNER_RANGE).trim_end(),
            field(GROUP_RANGE).trim_end(),
            parse_size(&field(SIZE_RANGE))?,
            ModifiedAt::new(month, day, hour, minute),
        );
        entry.selected = chars[0] == '*';
        Ok(entry)
    }
}

/// 指定幅に切り詰め、空白で左詰めする
fn fit(value: &str, width: usize) -> String {
    let truncated: String = value.chars().take(width).collect();
    format!("{:<width$}", truncated, width = width)
}

/// サイズを8文字に右詰めする。収まらない場合は単位付きで切り捨てる
fn format_size(size: u64) -> String {
    let limit = 10u64.pow(SIZE_WIDTH as u32);
    if size < limit {
        return format!("{:>width$}", size, width = SIZE_WIDTH);
    }

    let unit_limit = 10u64.pow(SIZE_WIDTH as u32 - 1);
    let mut value = size;
    for unit in SIZE_UNITS {
        value /= 1024;
        if value < unit_limit {
            return format!("{:>width$}{}", value, unit, width = SIZE_WIDTH - 1);
        }
    }
    // u64 の範囲では P で必ず収まる
    format!("{:>width$}P", value, width = SIZE_WIDTH - 1)
}

fn parse_size(raw: &str) -> Result<u64, FormatError> {
    let trimmed = raw.trim();
    let invalid = || FormatError::InvalidNumber {
        field: "size",
        value: raw.to_string(),
    };

    match trimmed.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => {
            let exponent = SIZE_UNITS
                .iter()
                .position(|unit| *unit == c)
                .ok_or_else(invalid)?
                + 1;
            let value = parse_digits(&trimmed[..trimmed.len() - 1]).ok_or_else(invalid)?;
            Ok(value.saturating_mul(1024u64.pow(exponent as u32)))
        }
        _ => parse_digits(trimmed).ok_or_else(invalid),
    }
}

/// 数字のみからなる欄を読む（`u64::from_str` が許す `+` 符号は拒否する）
fn parse_digits(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn parse_number(
    field: &'static str,
    raw: &str,
    range: std::ops::RangeInclusive<u64>,
) -> Result<u8, FormatError> {
    let value = parse_digits(raw.trim()).ok_or_else(|| FormatError::InvalidNumber {
        field,
        value: raw.to_string(),
    })?;
    if !range.contains(&value) {
        return Err(FormatError::OutOfRange { field, value });
    }
    Ok(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::io::{S_IFDIR, S_IFREG};
    use chrono::TimeZone;

    fn sample() -> Entry {
        Entry::new(
            "/tmp/d",
            "a.txt",
            "-rw-r--r--",
            "alice",
            "staff",
            42,
            ModifiedAt::new(3, 5, 10, 30),
        )
    }

    #[test]
    fn format_matches_fixed_columns() {
        let line = sample().format();
        assert_eq!(
            line,
            "  -rw-r--r-- alice    staff          42 03 05 10:30 a.txt"
        );
        assert_eq!(&line[31..39], "      42");
        assert_eq!(&line[40..42], "03");
        assert_eq!(&line[43..45], "05");
        assert_eq!(&line[NAME_COLUMN..], "a.txt");
    }

    #[test]
    fn parse_round_trips() {
        let mut entry = sample();
        entry.set_selected(true);
        let parsed = Entry::parse(Path::new("/tmp/d"), &entry.format()).unwrap();
        assert_eq!(parsed, entry);
        assert_eq!(parsed.kind(), EntryKind::File);
    }

    #[test]
    fn long_owner_names_are_truncated() {
        let entry = Entry::new(
            "/d",
            "x",
            "drwxr-xr-x",
            "maintenance",
            "developers",
            0,
            ModifiedAt::new(1, 1, 0, 0),
        );
        let parsed = Entry::parse(Path::new("/d"), &entry.format()).unwrap();
        assert_eq!(parsed.owner(), "maintena");
        assert_eq!(parsed.group(), "develope");
        assert_eq!(parsed.kind(), EntryKind::Directory);
    }

    #[test]
    fn unknown_owner_renders_blank() {
        let entry = Entry::new("/d", "x", "-rw-------", "", "", 1, ModifiedAt::new(12, 31, 23, 59));
        let line = entry.format();
        assert_eq!(&line[13..21], "        ");
        let parsed = Entry::parse(Path::new("/d"), &line).unwrap();
        assert_eq!(parsed.owner(), "");
    }

    #[test]
    fn names_keep_inner_and_trailing_spaces() {
        let entry = Entry::new("/d", "my file  ", "-rw-r--r--", "u", "g", 7, ModifiedAt::new(6, 1, 8, 5));
        let parsed = Entry::parse(Path::new("/d"), &entry.format()).unwrap();
        assert_eq!(parsed.name(), "my file  ");
    }

    #[test]
    fn oversized_sizes_keep_column_layout() {
        let entry = Entry::new("/d", "big.iso", "-rw-r--r--", "u", "g", 5 * 1024 * 1024 * 1024 * 1024, ModifiedAt::new(1, 2, 3, 4));
        let line = entry.format();
        assert_eq!(&line[NAME_COLUMN..], "big.iso");
        assert_eq!(line[31..39].trim(), "5242880M");

        let parsed = Entry::parse(Path::new("/d"), &line).unwrap();
        assert_eq!(parsed.size(), 5 * 1024 * 1024 * 1024 * 1024);
    }

    #[test]
    fn non_numeric_fields_are_format_errors() {
        let mut line = sample().format();
        line.replace_range(40..42, "xx");
        assert!(matches!(
            Entry::parse(Path::new("/tmp/d"), &line),
            Err(FormatError::InvalidNumber { field: "month", .. })
        ));

        let mut line = sample().format();
        line.replace_range(46..48, "99");
        assert!(matches!(
            Entry::parse(Path::new("/tmp/d"), &line),
            Err(FormatError::OutOfRange { field: "hour", value: 99 })
        ));
    }

    #[test]
    fn short_lines_are_rejected() {
        assert_eq!(
            Entry::parse(Path::new("/"), "/tmp/d:"),
            Err(FormatError::LineTooShort { length: 7 })
        );
        let line = sample().format();
        assert_eq!(
            Entry::parse(Path::new("/"), &line[..NAME_COLUMN]),
            Err(FormatError::EmptyName)
        );
    }

    #[test]
    fn signed_numbers_are_rejected() {
        let line = sample().format();

        let mut signed_size = line.clone();
        signed_size.replace_range(SIZE_RANGE, "      +5");
        assert!(matches!(
            Entry::parse(Path::new("/tmp/d"), &signed_size),
            Err(FormatError::InvalidNumber { field: "size", .. })
        ));

        let mut signed_suffix = line.clone();
        signed_suffix.replace_range(SIZE_RANGE, "     +5K");
        assert!(Entry::parse(Path::new("/tmp/d"), &signed_suffix).is_err());

        let mut signed_month = line;
        signed_month.replace_range(MONTH_RANGE, "+3");
        assert!(matches!(
            Entry::parse(Path::new("/tmp/d"), &signed_month),
            Err(FormatError::InvalidNumber { field: "month", .. })
        ));
    }

    #[test]
    fn unknown_mode_char_is_other() {
        let mut line = sample().format();
        line.replace_range(2..3, "l");
        let parsed = Entry::parse(Path::new("/tmp/d"), &line).unwrap();
        assert_eq!(parsed.kind(), EntryKind::Other);
    }

    #[test]
    fn from_stat_truncates_local_time() {
        let modified: SystemTime = Local
            .with_ymd_and_hms(2024, 3, 5, 10, 30, 0)
            .unwrap()
            .into();
        let stat = RawStat {
            mode: S_IFREG | 0o644,
            size: 42,
            uid: 1000,
            gid: 20,
            modified,
        };
        let resolver = IdentityResolver::from_records("alice:x:1000:20::/:/bin/sh", "staff:x:20:");

        let entry = Entry::from_stat(Path::new("/tmp/d"), "a.txt", &stat, &resolver).unwrap();
        assert_eq!(entry.modified(), ModifiedAt::new(3, 5, 10, 30));
        assert_eq!(entry.owner(), "alice");
        assert_eq!(entry.group(), "staff");
        assert_eq!(entry.mode(), "-rw-r--r--");
        assert!(!entry.is_selected());
    }

    #[test]
    fn out_of_range_modified_time_has_no_calendar() {
        let far = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(10_000_000_000_000);
        assert_eq!(ModifiedAt::from_system_time(far), None);

        let stat = RawStat {
            mode: S_IFREG | 0o644,
            size: 1,
            uid: 0,
            gid: 0,
            modified: far,
        };
        assert!(Entry::from_stat(Path::new("/tmp/d"), "future", &stat, &IdentityResolver::empty()).is_none());
    }

    #[test]
    fn pre_epoch_modified_time_is_converted() {
        let before = SystemTime::UNIX_EPOCH - std::time::Duration::from_millis(86_400_500);
        let expected: DateTime<Local> = DateTime::from_timestamp(-86_401, 500_000_000)
            .unwrap()
            .with_timezone(&Local);
        let modified = ModifiedAt::from_system_time(before).unwrap();
        assert_eq!(modified.day, expected.day() as u8);
        assert_eq!(modified.minute, expected.minute() as u8);
    }

    #[test]
    fn dot_entries_resolve_paths() {
        let stat = RawStat {
            mode: S_IFDIR | 0o755,
            size: 0,
            uid: 0,
            gid: 0,
            modified: SystemTime::UNIX_EPOCH,
        };
        let resolver = IdentityResolver::empty();
        let up = Entry::from_stat(Path::new("/tmp/d"), "..", &stat, &resolver).unwrap();
        assert!(up.is_dot());
        assert_eq!(up.path(), PathBuf::from("/tmp"));
    }
}
