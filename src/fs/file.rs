//! 文件句柄

use crate::{
    block::BlockDevice,
    dir::DirEntry,
    error::{Error, ErrorKind, Result},
    types::{PartitionTable, StorageId},
};
use alloc::vec::Vec;

use super::filesystem::Sdfs;
use super::types::SeekFrom;

/// 文件句柄
///
/// 只保存文件在设备上的位置和读指针，不持有任何缓存或设备资源，
/// 丢弃即关闭。读取需要通过 [`Sdfs`] 进行。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdFile {
    storage: StorageId,
    /// 文件起始绝对偏移
    start: u64,
    size: u32,
    /// 当前绝对偏移
    cursor: u64,
}

impl SdFile {
    pub(super) fn new(storage: StorageId, entry: &DirEntry) -> Self {
        Self {
            storage,
            start: entry.offset,
            size: entry.size,
            cursor: entry.offset,
        }
    }

    /// 所在存储设备
    pub fn storage(&self) -> StorageId {
        self.storage
    }

    /// 文件起始绝对偏移
    pub fn start(&self) -> u64 {
        self.start
    }

    /// 文件大小
    pub fn size(&self) -> u32 {
        self.size
    }

    /// 当前绝对偏移
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// 当前读位置（相对文件开头）
    pub fn tell(&self) -> u64 {
        self.cursor - self.start
    }

    /// 剩余可读字节数
    pub fn remaining(&self) -> u64 {
        self.start + self.size as u64 - self.cursor
    }

    /// 移动读位置
    ///
    /// 目标位置必须落在 `[0, size]` 内，否则返回 `InvalidInput`，读位置不变。
    ///
    /// # 返回
    ///
    /// 新的读位置（相对文件开头）
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let size = self.size as i128;
        let target = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::Current(d) => self.tell() as i128 + d as i128,
            SeekFrom::End(d) => size + d as i128,
        };

        if !(0..=size).contains(&target) {
            return Err(Error::new(ErrorKind::InvalidInput, "Seek out of file range"));
        }

        self.cursor = self.start + target as u64;
        Ok(target as u64)
    }

    /// 回到文件开头
    pub fn rewind(&mut self) {
        self.cursor = self.start;
    }

    /// 本次读取实际可读的长度（截断到文件末尾）
    pub(super) fn clamp(&self, len: usize) -> usize {
        core::cmp::min(len as u64, self.remaining()) as usize
    }

    pub(super) fn advance(&mut self, n: usize) {
        self.cursor += n as u64;
    }

    /// 从当前位置读取
    ///
    /// 等价于 [`Sdfs::read`]。
    pub fn read<D: BlockDevice, P: PartitionTable>(
        &mut self,
        fs: &Sdfs<D, P>,
        buf: &mut [u8],
    ) -> Result<usize> {
        fs.read(self, buf)
    }

    /// 从当前位置读到文件末尾
    pub fn read_to_end<D: BlockDevice, P: PartitionTable>(
        &mut self,
        fs: &Sdfs<D, P>,
    ) -> Result<Vec<u8>> {
        let mut buf = alloc::vec![0u8; self.remaining() as usize];
        let n = fs.read(self, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }
}
