//! 存储抽象：SD 卡根目录的列举与读取

use alloc::string::String;
use alloc::vec::Vec;

/// 目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(name: &str) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: &str) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// 存储设备
pub trait Storage {
    type Error: core::fmt::Debug;

    /// 挂载（或重新探测）存储卡，卡不存在或挂载失败返回 `false`
    fn mount(&mut self) -> bool;

    /// 列出根目录
    fn list_root(&mut self) -> Result<Vec<DirEntry>, Self::Error>;

    /// 文件字节数
    fn file_size(&mut self, name: &str) -> Result<usize, Self::Error>;

    /// 从头读取文件到 `buf`，返回读到的字节数
    fn read(&mut self, name: &str, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// 按扩展名划分的文件类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FileKind {
    Jpeg,
    /// 识别但不支持的图片格式（PNG/BMP）
    Unsupported,
    Other,
}

impl FileKind {
    /// 大小写不敏感地按扩展名分类
    ///
    /// FAT 短文件名会把 `.jpeg` 截成 `.JPE`，同样视为 JPEG。
    pub fn of(name: &str) -> FileKind {
        let Some((_, ext)) = name.rsplit_once('.') else {
            return FileKind::Other;
        };
        if ext.eq_ignore_ascii_case("jpg")
            || ext.eq_ignore_ascii_case("jpeg")
            || ext.eq_ignore_ascii_case("jpe")
        {
            FileKind::Jpeg
        } else if ext.eq_ignore_ascii_case("png") || ext.eq_ignore_ascii_case("bmp") {
            FileKind::Unsupported
        } else {
            FileKind::Other
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloc::vec;

    /// 内存中的存储卡
    #[derive(Default)]
    pub(crate) struct MemStorage {
        pub present: bool,
        pub files: Vec<(String, Vec<u8>)>,
        pub dirs: Vec<String>,
        pub mounts: usize,
        /// 读取时报 I/O 错误的文件
        pub unreadable: Vec<String>,
        /// 报告超大尺寸的文件
        pub oversized: Vec<String>,
    }

    impl MemStorage {
        pub(crate) fn with_files(names: &[&str]) -> Self {
            Self {
                present: true,
                files: names
                    .iter()
                    .map(|n| (String::from(*n), vec![0xFF, 0xD8, 0xFF, 0xE0]))
                    .collect(),
                ..Default::default()
            }
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    pub(crate) enum MemError {
        NoCard,
        NotFound,
        Io,
    }

    impl Storage for MemStorage {
        type Error = MemError;

        fn mount(&mut self) -> bool {
            self.mounts += 1;
            self.present
        }

        fn list_root(&mut self) -> Result<Vec<DirEntry>, MemError> {
            if !self.present {
                return Err(MemError::NoCard);
            }
            let mut entries: Vec<DirEntry> = self.dirs.iter().map(|d| DirEntry::dir(d)).collect();
            entries.extend(self.files.iter().map(|(n, _)| DirEntry::file(n)));
            Ok(entries)
        }

        fn file_size(&mut self, name: &str) -> Result<usize, MemError> {
            if self.oversized.iter().any(|n| n == name) {
                return Ok(usize::MAX);
            }
            self.files
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, data)| data.len())
                .ok_or(MemError::NotFound)
        }

        fn read(&mut self, name: &str, buf: &mut [u8]) -> Result<usize, MemError> {
            if self.unreadable.iter().any(|n| n == name) {
                return Err(MemError::Io);
            }
            let (_, data) = self
                .files
                .iter()
                .find(|(n, _)| n == name)
                .ok_or(MemError::NotFound)?;
            let len = data.len().min(buf.len());
            buf[..len].copy_from_slice(&data[..len]);
            Ok(len)
        }
    }

    #[test]
    fn classifies_by_extension() {
        assert_eq!(FileKind::of("photo.jpg"), FileKind::Jpeg);
        assert_eq!(FileKind::of("PHOTO.JPG"), FileKind::Jpeg);
        assert_eq!(FileKind::of("holiday.JpEg"), FileKind::Jpeg);
        assert_eq!(FileKind::of("HOLIDA~1.JPE"), FileKind::Jpeg);
        assert_eq!(FileKind::of("icon.png"), FileKind::Unsupported);
        assert_eq!(FileKind::of("SCAN.BMP"), FileKind::Unsupported);
        assert_eq!(FileKind::of("notes.txt"), FileKind::Other);
        assert_eq!(FileKind::of("jpg"), FileKind::Other);
        assert_eq!(FileKind::of("archive.jpg.zip"), FileKind::Other);
    }
}
