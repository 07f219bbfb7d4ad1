//! モード文字列
//!
//! `drwxr-xr-x` 形式の10文字表現

use crate::file::io::{S_IFBLK, S_IFCHR, S_IFDIR, S_IFIFO, S_IFLNK, S_IFMT, S_IFREG, S_IFSOCK};

/// モード文字列の長さ
pub const MODE_WIDTH: usize = 10;

const S_ISUID: u32 = 0o4000;
const S_ISGID: u32 = 0o2000;
const S_ISVTX: u32 = 0o1000;

/// 種別文字
pub fn type_char(mode: u32) -> char {
    match mode & S_IFMT {
        S_IFDIR => 'd',
        S_IFREG => '-',
        S_IFLNK => 'l',
        S_IFCHR => 'c',
        S_IFBLK => 'b',
        S_IFIFO => 'p',
        S_IFSOCK => 's',
        _ => '?',
    }
}

/// モードビットから10文字のモード文字列を作る
pub fn mode_string(mode: u32) -> String {
    let mut out = String::with_capacity(MODE_WIDTH);
    out.push(type_char(mode));

    // (読み, 書き, 実行, 特殊ビット, 特殊ビット時の文字)
    let triads = [
        (0o400, 0o200, 0o100, S_ISUID, 's'),
        (0o040, 0o020, 0o010, S_ISGID, 's'),
        (0o004, 0o002, 0o001, S_ISVTX, 't'),
    ];
    for (read, write, exec, special, special_char) in triads {
        out.push(if mode & read != 0 { 'r' } else { '-' });
        out.push(if mode & write != 0 { 'w' } else { '-' });
        let executable = mode & exec != 0;
        out.push(match (mode & special != 0, executable) {
            (true, true) => special_char,
            (true, false) => special_char.to_ascii_uppercase(),
            (false, true) => 'x',
            (false, false) => '-',
        });
    }
    out
}
