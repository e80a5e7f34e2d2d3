//! 镜像校验和
//!
//! 所有校验和都是按小端 u32 字的回绕累加，末尾不足 4 字节的部分不计入。
//!
//! - 目录校验和：全部目录项记录（不含目录头），存放在目录头 reserved[1]
//! - 文件校验和：文件内容，存放在各目录项的 checksum 字段
//! - 镜像校验和：目录头之后直到镜像末尾的全部字节，存放在目录头 checksum 字段，
//!   只作报告用

use crate::{
    block::BlockDevice,
    consts::SD_DIR_SIZE,
    error::{Error, ErrorKind, Result},
};
use byteorder::{ByteOrder, LittleEndian};

use super::lookup::DirLookup;

/// 校验时每次读取的字节数
const VERIFY_CHUNK: usize = 2048;

/// 按小端 u32 字累加
pub fn sum32(data: &[u8]) -> u32 {
    sum32_from(0, data)
}

/// 在已有累加值上继续累加
///
/// 除最后一段外，每段长度都应是 4 的倍数。
pub fn sum32_from(init: u32, data: &[u8]) -> u32 {
    data.chunks_exact(4)
        .fold(init, |acc, word| acc.wrapping_add(LittleEndian::read_u32(word)))
}

impl<'a, D: BlockDevice> DirLookup<'a, D> {
    /// 目录头 checksum 字段（镜像校验和）
    pub fn dir_checksum(&mut self) -> Result<u32> {
        Ok(self.header()?.checksum)
    }

    /// 按目录项记录重新计算目录校验和
    pub fn compute_dir_checksum(&mut self) -> Result<u32> {
        let header = self.header()?;
        let mut sum = 0u32;
        let mut raw = [0u8; SD_DIR_SIZE];
        for i in 0..header.entry_count {
            self.read_raw_record(i + 1, &mut raw)?;
            sum = sum32_from(sum, &raw);
        }
        Ok(sum)
    }

    /// 对 `[addr, addr + len)` 经缓存分段累加
    fn sum_range(&mut self, addr: u64, len: u64) -> Result<u32> {
        let mut chunk = [0u8; VERIFY_CHUNK];
        let mut sum = 0u32;
        let mut done = 0u64;

        while done < len {
            let n = core::cmp::min(VERIFY_CHUNK as u64, len - done) as usize;
            self.read_at(addr + done, &mut chunk[..n])?;
            sum = sum32_from(sum, &chunk[..n]);
            done += n as u64;
        }

        Ok(sum)
    }

    /// 校验整个镜像
    ///
    /// 先逐个检查文件校验和，再检查目录校验和，第一处不一致返回 `Corrupted`。
    pub fn verify(&mut self) -> Result<()> {
        let header = self.header()?;

        for (index, entry) in self.entries()?.iter().enumerate() {
            let sum = self.sum_range(entry.offset, entry.size as u64)?;
            if sum != entry.checksum {
                log::error!(
                    "[SDFS] file {} ({}) checksum mismatch: stored {:#010x}, computed {:#010x}",
                    index,
                    entry.name_str(),
                    entry.checksum,
                    sum
                );
                return Err(Error::new(ErrorKind::Corrupted, "File checksum mismatch"));
            }
        }

        let dir_sum = self.compute_dir_checksum()?;
        if dir_sum != header.dir_checksum {
            log::error!(
                "[SDFS] directory checksum mismatch: stored {:#010x}, computed {:#010x}",
                header.dir_checksum,
                dir_sum
            );
            return Err(Error::new(ErrorKind::Corrupted, "Directory checksum mismatch"));
        }

        log::info!(
            "[SDFS] verified {} files, {} bytes",
            header.entry_count,
            header.image_size
        );
        Ok(())
    }
}
