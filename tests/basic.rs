//! Basic integration tests for mmap-reader.

use mmap_reader::{
    map_async, map_request, map_sync, MapExecutor, MapMode, MappingErrorKind, MappingRequest,
    RequestStatus,
};
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("mmap_reader_test_{}_{}", name, std::process::id()));
    p
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i.wrapping_mul(31) ^ (i >> 8)) as u8).collect()
}

#[test]
fn scenario_missing_empty_and_data() -> anyhow::Result<()> {
    let missing = tmp_path("missing.bin");
    let _ = fs::remove_file(&missing);
    let err = map_sync(&missing).expect_err("missing file");
    assert_eq!(err.kind(), MappingErrorKind::OpenFailed);
    assert_eq!(err.path(), missing.as_path());

    let empty = tmp_path("empty.bin");
    fs::write(&empty, b"")?;
    let err = map_sync(&empty).expect_err("empty file");
    assert_eq!(err.kind(), MappingErrorKind::MapFailed);

    let data = tmp_path("data.bin");
    fs::write(&data, [0x41_u8, 0x42, 0x43])?;
    let view = map_sync(&data)?;
    assert_eq!(view.len(), 3);
    assert_eq!(&*view, &[0x41, 0x42, 0x43]);

    let (tx, rx) = mpsc::channel();
    map_async(&data, move |result| tx.send(result).expect("send"));
    let async_view = rx.recv_timeout(Duration::from_secs(10))??;
    assert_eq!(async_view.as_slice(), view.as_slice());
    // Exactly one delivery.
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

    drop(view);
    drop(async_view);
    fs::remove_file(&empty)?;
    fs::remove_file(&data)?;
    Ok(())
}

#[test]
fn length_and_bytes_match_sequential_read() -> anyhow::Result<()> {
    let page = 4096;
    for &size in &[1_usize, 7, page - 1, page, page + 1, 3 * page + 17, 1 << 20] {
        let path = tmp_path(&format!("sizes_{size}"));
        let bytes = pattern(size);
        fs::write(&path, &bytes)?;

        let view = map_sync(&path)?;
        assert_eq!(view.len() as u64, fs::metadata(&path)?.len());
        assert_eq!(view.as_slice(), fs::read(&path)?.as_slice());
        // Last byte is readable.
        assert_eq!(view[size - 1], bytes[size - 1]);

        drop(view);
        fs::remove_file(&path)?;
    }
    Ok(())
}

#[test]
fn async_missing_file_is_open_failed() {
    let missing = tmp_path("async_missing.bin");
    let _ = fs::remove_file(&missing);

    let (tx, rx) = mpsc::channel();
    map_async(&missing, move |result| tx.send(result).expect("send"));
    let err = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("callback")
        .expect_err("missing file");
    assert_eq!(err.kind(), MappingErrorKind::OpenFailed);
}

#[test]
fn async_empty_file_is_map_failed() {
    let path = tmp_path("async_empty.bin");
    fs::write(&path, b"").expect("write");

    let err = map_request(&path).wait().expect_err("empty file");
    assert_eq!(err.kind(), MappingErrorKind::MapFailed);

    fs::remove_file(&path).expect("cleanup");
}

#[cfg(unix)]
#[test]
fn directory_is_not_mappable() {
    let dir = tempfile::tempdir().expect("dir");
    let err = map_sync(dir.path()).expect_err("directory");
    // Opening a directory read-only succeeds on unix; mapping it does not.
    assert!(matches!(
        err.kind(),
        MappingErrorKind::MapFailed | MappingErrorKind::OpenFailed
    ));
}

#[test]
fn view_length_is_fixed_at_mapping_time() -> anyhow::Result<()> {
    let path = tmp_path("fixed_len");
    fs::write(&path, b"0123456789")?;

    let view = map_sync(&path)?;
    // Grow the file after mapping; the view keeps its original length.
    {
        use std::io::Write;
        let mut f = fs::OpenOptions::new().append(true).open(&path)?;
        f.write_all(b"more bytes")?;
    }
    assert_eq!(view.len(), 10);
    assert_eq!(&view[..], b"0123456789");

    let remapped = map_sync(&path)?;
    assert_eq!(remapped.len(), 20);

    drop(view);
    drop(remapped);
    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn pending_request_transitions_once() -> anyhow::Result<()> {
    let path = tmp_path("pending");
    fs::write(&path, b"pending bytes")?;

    let executor = MapExecutor::new();
    let pending = executor.request(&path);
    // Wait for completion before inspecting the terminal state.
    while pending.is_pending() {
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(pending.status(), RequestStatus::Completed);
    assert_eq!(pending.wait()?.len(), 13);

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn submit_honours_mode() -> anyhow::Result<()> {
    let path = tmp_path("submit_modes");
    fs::write(&path, b"mode")?;

    let executor = MapExecutor::new();
    for request in [
        MappingRequest::blocking(&path),
        MappingRequest::non_blocking(&path),
    ] {
        let mode = request.mode;
        let (tx, rx) = mpsc::channel();
        executor.submit(request, move |result| tx.send(result).expect("send"));
        let view = match mode {
            MapMode::Blocking => rx.try_recv()?,
            MapMode::NonBlocking => rx.recv_timeout(Duration::from_secs(10))?,
        }?;
        assert_eq!(&*view, b"mode");
    }

    fs::remove_file(&path)?;
    Ok(())
}
