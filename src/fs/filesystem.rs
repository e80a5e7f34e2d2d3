//! sdfs 文件系统核心结构

use crate::{
    block::{BlockDev, BlockDevice},
    cache::{CacheStats, SlotCache},
    consts::SDFS_MAX_PARTS,
    dir::{DirEntry, DirLookup},
    error::{Error, ErrorKind, Result},
    types::{PartitionTable, Region, StorageId},
};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use spin::Mutex;

use super::{file::SdFile, path::parse_path, types::SdfsConfig};

/// 锁内的全部共享状态
struct Inner<D: BlockDevice> {
    cache: SlotCache,
    devices: BTreeMap<StorageId, BlockDev<D>>,
}

/// sdfs 资源文件系统
///
/// 槽位缓存、中转缓冲区、命中统计以及所有绑定的块设备都放在同一把锁里，
/// 每个公开调用在整个调用期间持有这把锁。
///
/// # 示例
///
/// ```rust,ignore
/// use sdfs_core::{Sdfs, SdfsConfig, StorageId};
///
/// let fs = Sdfs::new(partitions, SdfsConfig::default())?;
/// fs.attach(StorageId::Nand, nand)?;
///
/// let mut file = fs.open_path("/NAND:A/logo.bin")?;
/// let mut buf = vec![0u8; file.size() as usize];
/// fs.read(&mut file, &mut buf)?;
/// ```
pub struct Sdfs<D: BlockDevice, P: PartitionTable> {
    partitions: P,
    inner: Mutex<Inner<D>>,
}

impl<D: BlockDevice, P: PartitionTable> Sdfs<D, P> {
    /// 创建文件系统
    ///
    /// 槽位在这里一次分配完毕。
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidState` - 缓存配置不合法
    pub fn new(partitions: P, config: SdfsConfig) -> Result<Self> {
        let cache = SlotCache::new(&config.cache)?;
        log::info!(
            "[SDFS] cache ready: {} small + {} large slots, {:?} fill",
            config.cache.small_slots,
            config.cache.large_slots,
            config.cache.fill_policy
        );

        Ok(Self {
            partitions,
            inner: Mutex::new(Inner {
                cache,
                devices: BTreeMap::new(),
            }),
        })
    }

    /// 绑定块设备
    ///
    /// `BootNand` 与 `Nand` 共用一个绑定。重复绑定会替换旧设备，
    /// 旧设备留下的缓存槽位不再会被命中。
    pub fn attach(&self, storage: StorageId, device: D) -> Result<()> {
        let binding = storage.binding();
        let bdev = BlockDev::new(device, binding as u8)?;

        let mut inner = self.inner.lock();
        if inner.devices.insert(binding, bdev).is_some() {
            inner.cache.invalidate_tag(binding as u8);
            log::warn!("[SDFS] {} device replaced", binding.volume());
        }
        Ok(())
    }

    /// 解除绑定并取回设备
    pub fn detach(&self, storage: StorageId) -> Option<D> {
        let binding = storage.binding();
        let mut inner = self.inner.lock();
        let bdev = inner.devices.remove(&binding)?;
        inner.cache.invalidate_tag(binding as u8);
        Some(bdev.into_inner())
    }

    /// 查找分区区域
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - 分区索引超出盘符范围
    /// - `ErrorKind::NotFound` - 分区表中没有该分区
    pub fn region(&self, storage: StorageId, part: u8) -> Result<Region> {
        if part >= SDFS_MAX_PARTS {
            return Err(Error::new(ErrorKind::InvalidInput, "Partition index out of range"));
        }

        let partition = self.partitions.sdfs_partition(storage, part).ok_or_else(|| {
            log::warn!("[SDFS] {}:{} has no partition", storage.volume(), part);
            Error::new(ErrorKind::NotFound, "Partition not found")
        })?;

        Ok(Region::new(storage, partition.base_offset))
    }

    /// 在持锁状态下对分区目录执行操作
    ///
    /// 分区表在加锁之前查询，持锁期间不调用外部协作者。
    fn with_dir<R>(
        &self,
        storage: StorageId,
        part: u8,
        f: impl FnOnce(&mut DirLookup<'_, D>) -> Result<R>,
    ) -> Result<R> {
        let region = self.region(storage, part)?;

        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let bdev = inner
            .devices
            .get_mut(&storage.binding())
            .ok_or(Error::new(ErrorKind::NoDevice, "No block device bound"))?;

        f(&mut DirLookup::new(bdev, &mut inner.cache, region))
    }

    /// 按名称查找目录项
    pub fn find(&self, storage: StorageId, part: u8, name: &str) -> Result<DirEntry> {
        self.with_dir(storage, part, |dir| dir.find(name))
    }

    /// 打开文件
    ///
    /// # 错误
    ///
    /// - `ErrorKind::NoDevice` - 存储没有绑定设备
    /// - `ErrorKind::NotFound` - 分区或文件不存在
    /// - `ErrorKind::Corrupted` - 目录头魔数不符
    /// - `ErrorKind::Io` - 设备读取失败
    pub fn open(&self, storage: StorageId, part: u8, name: &str) -> Result<SdFile> {
        let entry = self.find(storage, part, name)?;
        Ok(SdFile::new(storage, &entry))
    }

    /// 按路径打开文件（如 `/NAND:A/logo.bin`）
    pub fn open_path(&self, path: &str) -> Result<SdFile> {
        let p = parse_path(path)?;
        self.open(p.storage, p.part, p.name)
    }

    /// 按路径查询文件大小
    pub fn file_size(&self, path: &str) -> Result<u32> {
        let p = parse_path(path)?;
        Ok(self.find(p.storage, p.part, p.name)?.size)
    }

    /// 从文件当前位置读取
    ///
    /// 读取长度截断到文件末尾；已在末尾时返回 0 且不访问设备。
    /// 在文件范围内总是读满请求长度，成功后读位置前移。
    ///
    /// # 返回
    ///
    /// 实际读取的字节数
    pub fn read(&self, file: &mut SdFile, buf: &mut [u8]) -> Result<usize> {
        let n = file.clamp(buf.len());
        if n == 0 {
            return Ok(0);
        }

        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let bdev = inner
            .devices
            .get_mut(&file.storage().binding())
            .ok_or(Error::new(ErrorKind::NoDevice, "No block device bound"))?;
        bdev.read_cached(&mut inner.cache, file.cursor(), &mut buf[..n])?;

        file.advance(n);
        Ok(n)
    }

    /// 列出分区中的全部目录项
    pub fn entries(&self, storage: StorageId, part: u8) -> Result<Vec<DirEntry>> {
        self.with_dir(storage, part, |dir| dir.entries())
    }

    /// 目录头中的镜像校验和
    pub fn dir_checksum(&self, storage: StorageId, part: u8) -> Result<u32> {
        self.with_dir(storage, part, |dir| dir.dir_checksum())
    }

    /// 校验分区中的目录和所有文件
    pub fn verify(&self, storage: StorageId, part: u8) -> Result<()> {
        self.with_dir(storage, part, |dir| dir.verify())
    }

    /// 输出缓存统计并返回快照
    ///
    /// `level > 0` 时逐个输出常驻槽位。
    pub fn stats(&self, level: u32) -> CacheStats {
        let mut inner = self.inner.lock();
        inner.cache.dump(level);
        inner.cache.stats()
    }

    /// 在持锁状态下访问已绑定的设备
    pub fn with_device<R>(&self, storage: StorageId, f: impl FnOnce(&BlockDev<D>) -> R) -> Result<R> {
        let inner = self.inner.lock();
        let bdev = inner
            .devices
            .get(&storage.binding())
            .ok_or(Error::new(ErrorKind::NoDevice, "No block device bound"))?;
        Ok(f(bdev))
    }

    /// 在持锁状态下修改已绑定的设备
    pub fn with_device_mut<R>(
        &self,
        storage: StorageId,
        f: impl FnOnce(&mut BlockDev<D>) -> R,
    ) -> Result<R> {
        let mut inner = self.inner.lock();
        let bdev = inner
            .devices
            .get_mut(&storage.binding())
            .ok_or(Error::new(ErrorKind::NoDevice, "No block device bound"))?;
        Ok(f(bdev))
    }

    /// 分区表
    pub fn partitions(&self) -> &P {
        &self.partitions
    }
}
