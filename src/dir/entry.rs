//! 目录记录解析
//!
//! 目录头和目录项都是 32 字节小端记录：
//!
//! ```text
//! 0       12        16      20            28         32
//! | name  | offset  | size  | reserved[2] | checksum |
//! ```
//!
//! 目录头的 name 为 `"sdfs.bin"`，offset 字段存放条目数，
//! reserved[1] 存放目录校验和。

use crate::consts::*;
use crate::error::{Error, ErrorKind, Result};
use byteorder::{ByteOrder, LittleEndian};

/// 原始目录记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SdDirRecord {
    /// 文件名（NUL 填充的 ASCII）
    pub name: [u8; SD_NAME_LEN],
    /// 相对分区基址的偏移（目录头中为条目数）
    pub offset: u32,
    /// 文件大小（目录头中为镜像大小）
    pub size: u32,
    /// 保留字段（目录头中 reserved[1] 为目录校验和）
    pub reserved: [u32; 2],
    /// 文件校验和
    pub checksum: u32,
}

impl SdDirRecord {
    /// 从 32 字节解析
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < SD_DIR_SIZE {
            return Err(Error::new(ErrorKind::InvalidInput, "Directory record too short"));
        }

        let mut name = [0u8; SD_NAME_LEN];
        name.copy_from_slice(&raw[..SD_NAME_LEN]);

        Ok(Self {
            name,
            offset: LittleEndian::read_u32(&raw[SD_DIR_OFFSET_POS..]),
            size: LittleEndian::read_u32(&raw[SD_DIR_SIZE_POS..]),
            reserved: [
                LittleEndian::read_u32(&raw[SD_DIR_RESERVED0_POS..]),
                LittleEndian::read_u32(&raw[SD_DIR_RESERVED1_POS..]),
            ],
            checksum: LittleEndian::read_u32(&raw[SD_DIR_CHECKSUM_POS..]),
        })
    }

    /// 编码为 32 字节
    pub fn encode(&self) -> [u8; SD_DIR_SIZE] {
        let mut raw = [0u8; SD_DIR_SIZE];
        raw[..SD_NAME_LEN].copy_from_slice(&self.name);
        LittleEndian::write_u32(&mut raw[SD_DIR_OFFSET_POS..], self.offset);
        LittleEndian::write_u32(&mut raw[SD_DIR_SIZE_POS..], self.size);
        LittleEndian::write_u32(&mut raw[SD_DIR_RESERVED0_POS..], self.reserved[0]);
        LittleEndian::write_u32(&mut raw[SD_DIR_RESERVED1_POS..], self.reserved[1]);
        LittleEndian::write_u32(&mut raw[SD_DIR_CHECKSUM_POS..], self.checksum);
        raw
    }

    /// 是否带有目录头魔数
    pub fn has_magic(&self) -> bool {
        &self.name[..SDFS_MAGIC.len()] == SDFS_MAGIC
    }

    /// 与查询名比较（忽略大小写，最多 12 个字符，遇 NUL 结束）
    pub fn name_matches(&self, query: &str) -> bool {
        let q = query.as_bytes();
        for (i, stored) in self.name.iter().enumerate() {
            let c = q.get(i).copied().unwrap_or(0);
            if !c.eq_ignore_ascii_case(stored) {
                return false;
            }
            if c == 0 {
                return true;
            }
        }
        true
    }
}

/// 目录头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdDirHeader {
    /// 条目数
    pub entry_count: u32,
    /// 镜像大小
    pub image_size: u32,
    /// 目录校验和（所有条目记录按 u32 字累加）
    pub dir_checksum: u32,
    /// 镜像校验和
    pub checksum: u32,
}

impl SdDirHeader {
    /// 从记录解析，魔数不符时返回 `Corrupted`
    pub fn from_record(record: &SdDirRecord) -> Result<Self> {
        if !record.has_magic() {
            return Err(Error::new(ErrorKind::Corrupted, "sdfs.bin magic mismatch"));
        }
        Ok(Self {
            entry_count: record.offset,
            image_size: record.size,
            dir_checksum: record.reserved[1],
            checksum: record.checksum,
        })
    }

    /// 编码为目录头记录
    pub fn to_record(&self) -> SdDirRecord {
        let mut name = [0u8; SD_NAME_LEN];
        name[..SDFS_MAGIC.len()].copy_from_slice(SDFS_MAGIC);
        SdDirRecord {
            name,
            offset: self.entry_count,
            size: self.image_size,
            reserved: [0, self.dir_checksum],
            checksum: self.checksum,
        }
    }
}

/// 解析后的目录项（偏移已换算为设备绝对偏移）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    /// 文件名
    pub name: [u8; SD_NAME_LEN],
    /// 文件大小
    pub size: u32,
    /// 设备上的绝对偏移
    pub offset: u64,
    /// 文件校验和
    pub checksum: u32,
}

impl DirEntry {
    /// 由原始记录和分区基址构造
    pub fn from_record(record: &SdDirRecord, base: u64) -> Self {
        Self {
            name: record.name,
            size: record.size,
            offset: base + record.offset as u64,
            checksum: record.checksum,
        }
    }

    /// 文件名字符串（截至第一个 NUL）
    pub fn name_str(&self) -> &str {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(SD_NAME_LEN);
        core::str::from_utf8(&self.name[..end]).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &[u8]) -> SdDirRecord {
        let mut r = SdDirRecord::default();
        r.name[..name.len()].copy_from_slice(name);
        r
    }

    #[test]
    fn test_field_positions() {
        let r = SdDirRecord {
            name: *b"LOGO.BIN\0\0\0\0",
            offset: 0x1122_3344,
            size: 0x0000_0200,
            reserved: [0, 0xdead_beef],
            checksum: 0x0102_0304,
        };
        let raw = r.encode();
        assert_eq!(&raw[..8], b"LOGO.BIN");
        assert_eq!(&raw[12..16], &[0x44, 0x33, 0x22, 0x11]);
        assert_eq!(&raw[16..20], &[0x00, 0x02, 0x00, 0x00]);
        assert_eq!(&raw[24..28], &[0xef, 0xbe, 0xad, 0xde]);
        assert_eq!(&raw[28..32], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(SdDirRecord::parse(&raw).unwrap(), r);
    }

    #[test]
    fn test_name_matching() {
        let r = record(b"Logo.BIN");
        assert!(r.name_matches("logo.bin"));
        assert!(r.name_matches("LOGO.BIN"));
        assert!(!r.name_matches("logo.bi"));
        assert!(!r.name_matches("logo.bin2"));

        // 只比较前 12 个字符
        let r = record(b"abcdefghijkl");
        assert!(r.name_matches("ABCDEFGHIJKL"));
        assert!(r.name_matches("abcdefghijklmnop"));
        assert!(!r.name_matches("abcdefghijk"));
    }

    #[test]
    fn test_header_magic() {
        let header = SdDirHeader { entry_count: 3, image_size: 4096, dir_checksum: 7, checksum: 9 };
        let rec = header.to_record();
        assert!(rec.has_magic());
        assert_eq!(rec.encode()[12..16], 3u32.to_le_bytes());
        assert_eq!(SdDirHeader::from_record(&rec).unwrap(), header);

        let err = SdDirHeader::from_record(&record(b"sdfs.bim")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_entry_rebase() {
        let mut r = record(b"font.bin");
        r.offset = 0x40;
        r.size = 12;
        let e = DirEntry::from_record(&r, 0x10_0000);
        assert_eq!(e.offset, 0x10_0040);
        assert_eq!(e.name_str(), "font.bin");
    }
}
