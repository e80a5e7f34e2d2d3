//! 镜像构建
//!
//! 生成可直接写入分区的 sdfs 镜像：目录头、目录项、4 字节对齐的文件内容，
//! 并填好三种校验和。

use crate::{
    consts::{SD_DIR_SIZE, SD_NAME_LEN},
    error::{Error, ErrorKind, Result},
};
use alloc::string::String;
use alloc::vec::Vec;

use super::checksum::sum32;
use super::entry::{SdDirHeader, SdDirRecord};

/// 文件内容对齐
const BODY_ALIGN: usize = 4;

/// sdfs 镜像构建器
#[derive(Debug, Default, Clone)]
pub struct ImageBuilder {
    files: Vec<(String, Vec<u8>)>,
}

impl ImageBuilder {
    /// 创建空的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加文件（按追加顺序写入目录）
    pub fn add(mut self, name: &str, data: &[u8]) -> Self {
        self.files.push((String::from(name), data.to_vec()));
        self
    }

    /// 文件数
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// 是否还没有文件
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// 生成镜像
    ///
    /// 文件名超过 12 字节、镜像超过 4 GiB 时返回 `InvalidInput`。
    pub fn build(&self) -> Result<Vec<u8>> {
        let dir_len = (self.files.len() + 1) * SD_DIR_SIZE;

        let mut records = Vec::with_capacity(self.files.len());
        let mut offset = dir_len;
        for (name, data) in &self.files {
            if name.len() > SD_NAME_LEN {
                return Err(Error::new(ErrorKind::InvalidInput, "File name longer than 12 bytes"));
            }

            let mut record = SdDirRecord::default();
            record.name[..name.len()].copy_from_slice(name.as_bytes());
            record.offset = to_u32(offset)?;
            record.size = to_u32(data.len())?;
            record.checksum = sum32(data);
            records.push(record);

            offset += align_up(data.len());
        }

        let mut image = Vec::with_capacity(offset);
        image.resize(SD_DIR_SIZE, 0);
        for record in &records {
            image.extend_from_slice(&record.encode());
        }
        for (_, data) in &self.files {
            image.extend_from_slice(data);
            image.resize(align_up(image.len()), 0);
        }

        let header = SdDirHeader {
            entry_count: to_u32(records.len())?,
            image_size: to_u32(image.len())?,
            dir_checksum: sum32(&image[SD_DIR_SIZE..dir_len]),
            checksum: sum32(&image[SD_DIR_SIZE..]),
        };
        image[..SD_DIR_SIZE].copy_from_slice(&header.to_record().encode());

        log::debug!(
            "[SDFS] built image: {} files, {} bytes",
            records.len(),
            image.len()
        );
        Ok(image)
    }
}

fn align_up(len: usize) -> usize {
    (len + BODY_ALIGN - 1) & !(BODY_ALIGN - 1)
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::new(ErrorKind::InvalidInput, "Image too large"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SDFS_MAGIC;

    #[test]
    fn test_layout() {
        let image = ImageBuilder::new()
            .add("a.txt", b"abcde")
            .add("b.txt", b"xyz")
            .build()
            .unwrap();

        // 目录 3 * 32 = 96，a 占 8，b 占 4
        assert_eq!(image.len(), 96 + 8 + 4);
        assert_eq!(&image[..8], SDFS_MAGIC);

        let header = SdDirHeader::from_record(&SdDirRecord::parse(&image[..32]).unwrap()).unwrap();
        assert_eq!(header.entry_count, 2);
        assert_eq!(header.image_size, 108);

        let a = SdDirRecord::parse(&image[32..64]).unwrap();
        let b = SdDirRecord::parse(&image[64..96]).unwrap();
        assert_eq!((a.offset, a.size), (96, 5));
        assert_eq!((b.offset, b.size), (104, 3));
        assert_eq!(&image[96..101], b"abcde");
        assert_eq!(&image[101..104], &[0, 0, 0]);
        assert_eq!(&image[104..107], b"xyz");
        assert_eq!(a.checksum, sum32(b"abcde"));
    }

    #[test]
    fn test_empty_image() {
        let image = ImageBuilder::new().build().unwrap();
        assert_eq!(image.len(), SD_DIR_SIZE);
        let header = SdDirHeader::from_record(&SdDirRecord::parse(&image).unwrap()).unwrap();
        assert_eq!(header.entry_count, 0);
        assert_eq!(header.dir_checksum, 0);
        assert_eq!(header.checksum, 0);
    }

    #[test]
    fn test_name_too_long() {
        let ok = ImageBuilder::new().add("twelve_chars", b"x").build();
        assert!(ok.is_ok());

        let err = ImageBuilder::new().add("thirteen_char", b"x").build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
