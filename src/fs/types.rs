//! 上层 API 使用的类型定义

use crate::cache::CacheConfig;

/// 文件系统配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SdfsConfig {
    /// 槽位缓存配置
    pub cache: CacheConfig,
}

impl SdfsConfig {
    /// 按可用后备内存（KiB）选择缓存规模
    pub fn for_ram_kib(kib: u32) -> Self {
        Self {
            cache: CacheConfig::for_ram_kib(kib),
        }
    }
}

/// 文件定位方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    /// 相对文件开头
    Start(u64),
    /// 相对当前位置
    Current(i64),
    /// 相对文件末尾（只能为 0 或负数）
    End(i64),
}
