//! 基于内存的块设备
//!
//! 用于测试、主机侧镜像检查以及 RAM 盘。记录每一次扇区读取，
//! 并支持注入读取失败。

use super::BlockDevice;
use crate::consts::SECTOR_SIZE;
use crate::error::{Error, ErrorKind, Result};
use alloc::vec::Vec;

/// 内存块设备
#[derive(Debug, Clone)]
pub struct MemDevice {
    data: Vec<u8>,
    sector_size: u32,
    /// 读取日志：`(偏移, 长度)`
    reads: Vec<(u64, usize)>,
    /// 还需注入失败的读取次数
    fail_reads: usize,
}

impl MemDevice {
    /// 以给定内容创建设备
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_sector_size(data, SECTOR_SIZE)
    }

    /// 以给定内容和扇区大小创建设备
    pub fn with_sector_size(data: Vec<u8>, sector_size: u32) -> Self {
        Self {
            data,
            sector_size,
            reads: Vec::new(),
            fail_reads: 0,
        }
    }

    /// 设备内容
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 设备内容（可写，用于构造测试数据）
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// 已发生的读取
    pub fn reads(&self) -> &[(u64, usize)] {
        &self.reads
    }

    /// 清空读取日志
    pub fn clear_reads(&mut self) {
        self.reads.clear();
    }

    /// 让接下来 `count` 次读取失败
    pub fn fail_next_reads(&mut self, count: usize) {
        self.fail_reads = count;
    }
}

impl BlockDevice for MemDevice {
    fn sector_size(&self) -> u32 {
        self.sector_size
    }

    fn read_sectors(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.reads.push((offset, buf.len()));

        if self.fail_reads > 0 {
            self.fail_reads -= 1;
            return Err(Error::new(ErrorKind::Io, "Injected read failure"));
        }

        let start = usize::try_from(offset)
            .map_err(|_| Error::new(ErrorKind::Io, "Read beyond end of device"))?;
        let end = start
            .checked_add(buf.len())
            .filter(|end| *end <= self.data.len())
            .ok_or(Error::new(ErrorKind::Io, "Read beyond end of device"))?;

        buf.copy_from_slice(&self.data[start..end]);
        Ok(())
    }

    fn name(&self) -> &str {
        "mem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_read_and_log() {
        let mut dev = MemDevice::new((0..=255u8).cycle().take(2048).collect());
        let mut buf = [0u8; 512];

        dev.read_sectors(512, &mut buf).unwrap();
        assert_eq!(buf[0], 0);
        assert_eq!(buf[1], 1);
        assert_eq!(dev.reads(), &[(512, 512)]);
    }

    #[test]
    fn test_out_of_bounds_and_injected_failure() {
        let mut dev = MemDevice::new(vec![0u8; 1024]);
        let mut buf = [0u8; 1024];

        assert_eq!(dev.read_sectors(512, &mut buf).unwrap_err().kind(), ErrorKind::Io);

        dev.fail_next_reads(1);
        assert!(dev.read_sectors(0, &mut buf).is_err());
        assert!(dev.read_sectors(0, &mut buf).is_ok());
        assert_eq!(dev.reads().len(), 3);
    }
}
