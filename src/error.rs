//! 错误类型定义
//!
//! 提供 SDFS 读缓存与目录操作的错误类型。

use core::fmt;

/// SDFS 操作错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// I/O 错误（底层块读取失败，原样上报，不重试）
    Io,
    /// 无效参数
    InvalidInput,
    /// 目录损坏（魔数不匹配或校验和错误）
    Corrupted,
    /// 文件或分区不存在
    NotFound,
    /// 存储 ID 没有绑定块设备
    NoDevice,
    /// 无效状态（配置不满足约束）
    InvalidState,
}

impl Error {
    /// 创建新错误
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// 获取错误类型
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取错误消息
    pub const fn message(&self) -> &'static str {
        self.message
    }

    /// 是否为“未找到”
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// 是否为目录损坏
    pub fn is_corrupted(&self) -> bool {
        self.kind == ErrorKind::Corrupted
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result 类型别名
pub type Result<T> = core::result::Result<T, Error>;
