//! Integration tests for backing regions

mod common;

use std::os::fd::AsFd;

use tempfile::TempDir;
use shmcanvas::{
    memory::{BackingConfig, BackingRegion, BackingType, Directory},
    ShmError,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backing_config_builder() {
        let config = BackingConfig::default()
            .with_backing_type(BackingType::ShmOpen)
            .with_name_prefix("/builder")
            .with_max_name_attempts(3);

        assert_eq!(config.backing_type, BackingType::ShmOpen);
        assert_eq!(config.name_prefix, "/builder");
        assert_eq!(config.max_name_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_backed_region_round_trip() {
        common::init_logging();
        let temp_dir = TempDir::new().unwrap();
        let config = BackingConfig::default().with_backing_type(BackingType::FileBacked {
            dir: temp_dir.path().to_path_buf(),
        });

        let mut region = BackingRegion::create(&config, 64 * 1024).unwrap();
        assert_eq!(region.len(), 64 * 1024);
        assert!(region.as_slice().iter().all(|&b| b == 0));

        let pattern: Vec<u8> = (0..region.len()).map(|i| (i % 251) as u8).collect();
        region.as_mut_slice().copy_from_slice(&pattern);
        assert_eq!(region.as_slice(), pattern.as_slice());
    }

    #[test]
    fn test_writes_visible_through_descriptor() {
        use std::{io::Read, os::unix::fs::FileExt};

        let temp_dir = TempDir::new().unwrap();
        let config = BackingConfig::default().with_backing_type(BackingType::FileBacked {
            dir: temp_dir.path().to_path_buf(),
        });
        let mut region = BackingRegion::create(&config, 4096).unwrap();
        region.as_mut_slice()[100..104].copy_from_slice(b"ARGB");

        // A second description of the same file sees the mapped bytes
        let file = std::fs::File::from(region.as_fd().try_clone_to_owned().unwrap());
        let mut bytes = [0u8; 4];
        file.read_exact_at(&mut bytes, 100).unwrap();
        assert_eq!(&bytes, b"ARGB");

        let mut all = Vec::new();
        (&file).read_to_end(&mut all).unwrap();
        assert_eq!(all.len(), 4096);
    }

    #[test]
    fn test_file_backed_name_removed() {
        let temp_dir = TempDir::new().unwrap();
        let config = BackingConfig::default().with_backing_type(BackingType::FileBacked {
            dir: temp_dir.path().to_path_buf(),
        });

        let regions: Vec<BackingRegion> = (0..8)
            .map(|_| BackingRegion::create(&config, 4096).unwrap())
            .collect();
        assert_eq!(regions.len(), 8);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_explicit_directory_namespace() {
        let temp_dir = TempDir::new().unwrap();
        let namespace = Directory::new(temp_dir.path());
        assert_eq!(namespace.path(), temp_dir.path());

        let region = BackingRegion::create_in(&namespace, &BackingConfig::default(), 128).unwrap();
        assert_eq!(region.len(), 128);
    }

    #[test]
    fn test_collision_budget_reported() {
        let namespace = common::AlwaysTaken::new();
        let config = BackingConfig::default().with_max_name_attempts(7);

        let err = BackingRegion::create_in(&namespace, &config, 4096).unwrap_err();
        assert!(matches!(err, ShmError::BackingAllocationFailed { attempts: 7, .. }));
        assert_eq!(namespace.attempts.get(), 7);
    }

    #[test]
    fn test_missing_directory_fails_allocation() {
        let config = BackingConfig::default().with_backing_type(BackingType::FileBacked {
            dir: "/definitely/not/here".into(),
        });
        assert!(config.validate().is_ok());

        let err = BackingRegion::create(&config, 4096).unwrap_err();
        match err {
            ShmError::BackingAllocationFailed { attempts, source } => {
                assert_eq!(attempts, 1);
                assert_eq!(source.unwrap().kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_memfd_region() {
        let config = BackingConfig::default().with_backing_type(BackingType::MemFd);
        let mut region = BackingRegion::create(&config, 4096).unwrap();

        assert_eq!(region.backing_type().name(), "memfd");
        region.as_mut_slice().fill(0x7f);
        assert!(region.as_slice().iter().all(|&b| b == 0x7f));
    }
}
