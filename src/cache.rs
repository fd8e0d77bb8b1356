use log::debug;
use serde::de::DeserializeOwned;
use serde_derive::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::Error;

/// Cached stage result stamped with the number of frames it was computed from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub frame_count: usize,
    pub data: T,
}

pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    if !path.exists() {
        return Err(Error::missing("cache", path));
    }

    let reader = BufReader::new(File::open(path)?);

    Ok(serde_json::from_reader(reader)?)
}

pub fn store<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, value)?;
    debug!("stored cache {}", path.display());

    Ok(())
}

/// Loads a stage cache if the file exists.
///
/// `Ok(None)` when there is no file, `CacheMismatch` when the cache was built
/// from a different number of frames.
pub fn load_checked<T: DeserializeOwned>(path: &Path, frame_count: usize) -> Result<Option<T>, Error> {
    if !path.exists() {
        return Ok(None);
    }

    let cached: Cached<T> = load(path)?;
    if cached.frame_count != frame_count {
        return Err(Error::CacheMismatch {
            path: path.to_path_buf(),
            expected: frame_count,
            found: cached.frame_count,
        });
    }

    Ok(Some(cached.data))
}

pub fn store_checked<T: serde::Serialize>(path: &Path, frame_count: usize, data: &T) -> Result<(), Error> {
    store(path, &Cached { frame_count, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_count_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stubs").join("movement.json");

        store_checked(&path, 3, &vec![1.0f32, 2.0, 3.0]).unwrap();

        let hit: Option<Vec<f32>> = load_checked(&path, 3).unwrap();
        assert_eq!(hit, Some(vec![1.0, 2.0, 3.0]));

        let miss = load_checked::<Vec<f32>>(&path, 4);
        assert!(matches!(miss, Err(Error::CacheMismatch { expected: 4, found: 3, .. })));
    }

    #[test]
    fn absent_cache_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nothing.json");

        assert!(load_checked::<Vec<f32>>(&path, 1).unwrap().is_none());
        assert!(matches!(load::<Vec<f32>>(&path), Err(Error::MissingInput { .. })));
    }

    #[test]
    fn points_round_trip_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        let points = vec![nalgebra::Point2::new(1.5f32, -2.0), nalgebra::Point2::new(0.0, 7.25)];

        store(&path, &points).unwrap();

        assert_eq!(load::<Vec<nalgebra::Point2<f32>>>(&path).unwrap(), points);
    }
}
