//! 目录查找
//!
//! 目录位于分区起始处：一个目录头加 `entry_count` 个目录项，每条 32 字节，
//! 全部经过槽位缓存读取。

use crate::{
    block::{BlockDev, BlockDevice},
    cache::SlotCache,
    consts::SD_DIR_SIZE,
    error::{Error, ErrorKind, Result},
    types::Region,
};
use alloc::vec::Vec;

use super::entry::{DirEntry, SdDirHeader, SdDirRecord};

/// 目录查找器
///
/// 持有设备和缓存的可变借用，调用方负责在外层加锁。
pub struct DirLookup<'a, D: BlockDevice> {
    bdev: &'a mut BlockDev<D>,
    cache: &'a mut SlotCache,
    region: Region,
}

impl<'a, D: BlockDevice> DirLookup<'a, D> {
    /// 创建新的目录查找器
    pub fn new(bdev: &'a mut BlockDev<D>, cache: &'a mut SlotCache, region: Region) -> Self {
        Self { bdev, cache, region }
    }

    /// 分区区域
    pub fn region(&self) -> Region {
        self.region
    }

    /// 经缓存读取一条目录记录
    ///
    /// `index` 为 0 时是目录头。
    fn read_record(&mut self, index: u32) -> Result<SdDirRecord> {
        let mut raw = [0u8; SD_DIR_SIZE];
        let addr = self.region.base + index as u64 * SD_DIR_SIZE as u64;
        self.bdev.read_cached(self.cache, addr, &mut raw)?;
        SdDirRecord::parse(&raw)
    }

    /// 读取并校验目录头
    pub fn header(&mut self) -> Result<SdDirHeader> {
        let record = self.read_record(0)?;
        SdDirHeader::from_record(&record).map_err(|e| {
            log::warn!("[SDFS] sdfs.bin magic mismatch at {:#x}", self.region.base);
            e
        })
    }

    /// 按名称查找文件
    ///
    /// 名称比较忽略大小写，只看前 12 个字符。多个条目同名时返回第一个。
    ///
    /// # 返回
    ///
    /// 偏移已换算为设备绝对偏移的目录项；没有匹配时返回 `NotFound`
    pub fn find(&mut self, name: &str) -> Result<DirEntry> {
        let header = self.header()?;

        for i in 0..header.entry_count {
            let record = self.read_record(i + 1)?;
            if record.name_matches(name) {
                let entry = DirEntry::from_record(&record, self.region.base);
                log::debug!(
                    "[SDFS] found {} at {:#x}, size {}",
                    name,
                    entry.offset,
                    entry.size
                );
                return Ok(entry);
            }
        }

        log::warn!("[SDFS] {} not found in {} entries", name, header.entry_count);
        Err(Error::new(ErrorKind::NotFound, "File not found in sdfs directory"))
    }

    /// 遍历目录
    pub fn iter(&mut self) -> Result<DirIterator<'_, 'a, D>> {
        let header = self.header()?;
        Ok(DirIterator {
            lookup: self,
            next: 0,
            count: header.entry_count,
        })
    }

    /// 读取所有目录项
    ///
    /// 条目数来自闪存上的目录头，不据此预分配。
    pub fn entries(&mut self) -> Result<Vec<DirEntry>> {
        let mut iter = self.iter()?;
        let mut entries = Vec::new();
        while let Some(entry) = iter.next_entry()? {
            entries.push(entry);
        }
        Ok(entries)
    }

    /// 目录记录的原始字节（校验用）
    pub(super) fn read_raw_record(&mut self, index: u32, raw: &mut [u8; SD_DIR_SIZE]) -> Result<()> {
        let addr = self.region.base + index as u64 * SD_DIR_SIZE as u64;
        self.bdev.read_cached(self.cache, addr, raw)
    }

    /// 经缓存读取文件内容
    pub(super) fn read_at(&mut self, addr: u64, buf: &mut [u8]) -> Result<()> {
        self.bdev.read_cached(self.cache, addr, buf)
    }
}

/// 目录迭代器
///
/// 每次读取一条记录，IO 错误会中止遍历。
pub struct DirIterator<'l, 'a, D: BlockDevice> {
    lookup: &'l mut DirLookup<'a, D>,
    next: u32,
    count: u32,
}

impl<'l, 'a, D: BlockDevice> DirIterator<'l, 'a, D> {
    /// 剩余条目数
    pub fn remaining(&self) -> u32 {
        self.count - self.next
    }

    /// 下一条目录项
    pub fn next_entry(&mut self) -> Result<Option<DirEntry>> {
        if self.next >= self.count {
            return Ok(None);
        }

        let record = self.lookup.read_record(self.next + 1)?;
        self.next += 1;
        Ok(Some(DirEntry::from_record(&record, self.lookup.region.base)))
    }
}

/// 便捷函数：在分区中按名称查找文件
pub fn find_entry<D: BlockDevice>(
    bdev: &mut BlockDev<D>,
    cache: &mut SlotCache,
    region: Region,
    name: &str,
) -> Result<DirEntry> {
    DirLookup::new(bdev, cache, region).find(name)
}
