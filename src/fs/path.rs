//! 资源路径解析
//!
//! 路径格式为 `/<卷名>:<分区盘符>/<文件名>`，例如 `/NAND:A/logo.bin`。
//! 卷名见 [`StorageId::from_volume`]，盘符 `A..=Z` 对应分区索引 0..=25。

use crate::{
    error::{Error, ErrorKind, Result},
    types::StorageId,
};

/// 解析后的资源路径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdPath<'a> {
    /// 存储设备
    pub storage: StorageId,
    /// 分区索引
    pub part: u8,
    /// 文件名
    pub name: &'a str,
}

const fn bad_path(message: &'static str) -> Error {
    Error::new(ErrorKind::InvalidInput, message)
}

/// 解析资源路径
pub fn parse_path(path: &str) -> Result<SdPath<'_>> {
    let rest = path
        .strip_prefix('/')
        .ok_or(bad_path("Path must start with '/'"))?;
    let (volume, rest) = rest
        .split_once(':')
        .ok_or(bad_path("Path has no volume separator"))?;
    let storage = StorageId::from_volume(volume).ok_or(bad_path("Unknown volume"))?;

    let (letter, name) = rest
        .split_once('/')
        .ok_or(bad_path("Path has no file name"))?;

    let part = match letter.as_bytes() {
        [c @ b'A'..=b'Z'] => c - b'A',
        _ => return Err(bad_path("Bad partition letter")),
    };

    if name.is_empty() {
        return Err(bad_path("Path has no file name"));
    }

    Ok(SdPath { storage, part, name })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path() {
        let p = parse_path("/NAND:A/logo.bin").unwrap();
        assert_eq!(p, SdPath { storage: StorageId::Nand, part: 0, name: "logo.bin" });

        let p = parse_path("/SD:C/font.ttf").unwrap();
        assert_eq!((p.storage, p.part, p.name), (StorageId::Sd, 2, "font.ttf"));

        let p = parse_path("/DATA:Z/x").unwrap();
        assert_eq!((p.storage, p.part), (StorageId::DataNor, 25));
    }

    #[test]
    fn test_bad_paths() {
        for path in [
            "NAND:A/logo.bin",
            "/NAND/logo.bin",
            "/FLASH:A/logo.bin",
            "/NAND:/logo.bin",
            "/NAND:a/logo.bin",
            "/NAND:AB/logo.bin",
            "/NAND:A",
            "/NAND:A/",
        ] {
            let err = parse_path(path).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{}", path);
        }
    }
}
