//! End-to-end scenarios through the `Context` surface: allocate or load,
//! mutate, export, reload.

use texforge::{Context, Format};

fn context() -> Context {
    let _ = env_logger::builder().is_test(true).try_init();
    Context::new()
}

fn checker_2x2() -> [u8; 16] {
    // black, white / white, black
    [
        0, 0, 0, 255, 255, 255, 255, 255, //
        255, 255, 255, 255, 0, 0, 0, 255,
    ]
}

#[test]
fn png_round_trip_preserves_bytes() {
    let ctx = context();
    let id = ctx.image_allocate(Format::Rgba8Srgb, 2, 2, 1, 1, 1);
    assert_ne!(id, 0);
    assert!(ctx.with_mipmap_mut(id, 0, 0, |data| {
        data.copy_from_slice(&checker_2x2());
    }));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checker.png");
    assert!(
        ctx.image_save(id, &path, Format::Rgba8Srgb, 80),
        "{}",
        ctx.last_error()
    );

    let reloaded = ctx.image_open(&path);
    assert_ne!(reloaded, 0, "{}", ctx.last_error());
    let info = ctx.image_info(reloaded).unwrap();
    assert_eq!((info.width, info.height), (2, 2));
    assert_eq!(info.format, Format::Rgba8Srgb);

    let mut bytes = Vec::new();
    ctx.with_mipmap_mut(reloaded, 0, 0, |data| bytes = data.to_vec());
    assert_eq!(bytes, checker_2x2());
}

#[test]
fn black_and_white_survive_float_export() {
    // black and white are fixed points of the srgb curve, so a trip
    // through float staging and back must be lossless for them
    let ctx = context();
    let id = ctx.image_allocate(Format::Rgba8Srgb, 2, 2, 1, 1, 1);
    ctx.with_mipmap_mut(id, 0, 0, |data| data.copy_from_slice(&checker_2x2()));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checker.hdr");
    assert!(
        ctx.image_save(id, &path, Format::Rgba32Float, 80),
        "{}",
        ctx.last_error()
    );

    let reloaded = ctx.image_open(&path);
    assert_ne!(reloaded, 0, "{}", ctx.last_error());
    assert_eq!(ctx.image_info(reloaded).unwrap().format, Format::Rgba32Float);

    let mut floats = Vec::new();
    ctx.with_mipmap_mut(reloaded, 0, 0, |data| {
        floats = data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
    });
    // texel 0 black, texel 1 white
    assert_eq!(&floats[0..3], &[0.0, 0.0, 0.0]);
    assert_eq!(&floats[4..7], &[1.0, 1.0, 1.0]);
}

#[test]
fn pfm_round_trip_through_context() {
    let ctx = context();
    let id = ctx.image_allocate(Format::Rgba32Float, 2, 1, 1, 1, 1);
    ctx.with_mipmap_mut(id, 0, 0, |data| {
        for (i, v) in [0.25f32, 0.5, 0.75, 1.0, 2.0, 4.0, 8.0, 1.0]
            .iter()
            .enumerate()
        {
            data[i * 4..i * 4 + 4].copy_from_slice(&v.to_le_bytes());
        }
    });

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hdr.pfm");
    assert!(
        ctx.image_save(id, &path, Format::Rgba32Float, 80),
        "{}",
        ctx.last_error()
    );

    let reloaded = ctx.image_open(&path);
    assert_ne!(reloaded, 0, "{}", ctx.last_error());
    let mut a = Vec::new();
    let mut b = Vec::new();
    ctx.with_mipmap_mut(id, 0, 0, |d| a = d.to_vec());
    ctx.with_mipmap_mut(reloaded, 0, 0, |d| b = d.to_vec());
    assert_eq!(a, b);
}

#[test]
fn dds_bc1_export_decompresses_on_open() {
    let ctx = context();
    let id = ctx.image_allocate(Format::Rgba8Unorm, 8, 8, 1, 1, 1);
    ctx.with_mipmap_mut(id, 0, 0, |data| {
        for texel in data.chunks_exact_mut(4) {
            texel.copy_from_slice(&[255, 0, 0, 255]);
        }
    });

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("red.dds");
    assert!(
        ctx.image_save(id, &path, Format::Bc1Unorm, 80),
        "{}",
        ctx.last_error()
    );
    // the registry entry now holds the converted texture
    assert_eq!(ctx.image_info(id).unwrap().format, Format::Bc1Unorm);

    let reloaded = ctx.image_open(&path);
    assert_ne!(reloaded, 0, "{}", ctx.last_error());
    let info = ctx.image_info(reloaded).unwrap();
    assert_eq!(info.format, Format::Rgba8Unorm);
    assert_eq!(info.original_format, Format::Bc1Unorm);

    let mut bytes = Vec::new();
    ctx.with_mipmap_mut(reloaded, 0, 0, |d| bytes = d.to_vec());
    for texel in bytes.chunks_exact(4) {
        assert!(texel[0] >= 250, "red collapsed: {texel:?}");
        assert_eq!(texel[3], 255);
    }
}

#[test]
fn ktx2_round_trip_with_mips() {
    let ctx = context();
    let id = ctx.image_allocate(Format::Rgba8Unorm, 4, 4, 1, 1, 3);
    for mip in 0..3 {
        ctx.with_mipmap_mut(id, 0, mip, |data| data.fill(mip as u8 + 1));
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.ktx2");
    assert!(
        ctx.image_save(id, &path, Format::Rgba8Unorm, 80),
        "{}",
        ctx.last_error()
    );

    let reloaded = ctx.image_open(&path);
    assert_ne!(reloaded, 0, "{}", ctx.last_error());
    let info = ctx.image_info(reloaded).unwrap();
    assert_eq!(info.mipmaps, 3);
    for mip in 0..3 {
        let mut bytes = Vec::new();
        ctx.with_mipmap_mut(reloaded, 0, mip, |d| bytes = d.to_vec());
        assert!(bytes.iter().all(|&b| b == mip as u8 + 1));
    }
}

#[test]
fn progress_callback_sees_a_full_run() {
    use std::sync::{Arc, Mutex};

    let ctx = context();
    let id = ctx.image_allocate(Format::Rgba8Unorm, 16, 16, 1, 1, 1);

    let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    ctx.set_progress_callback(Some(Box::new(move |fraction, _phase| {
        sink.lock().unwrap().push((fraction * 100.0).round() as u32);
        false
    })));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.hdr");
    assert!(
        ctx.image_save(id, &path, Format::Rgba32Float, 80),
        "{}",
        ctx.last_error()
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen.first(), Some(&0));
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] < w[1]), "regressed: {seen:?}");
}

#[test]
fn progress_callback_may_reenter_the_context() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    let ctx = Arc::new(context());
    let calls = Arc::new(AtomicU32::new(0));

    let inner = Arc::clone(&ctx);
    let counter = Arc::clone(&calls);
    ctx.set_progress_callback(Some(Box::new(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        // detaching the callback from inside itself must not deadlock
        inner.set_progress_callback(None);
        false
    })));

    let id = ctx.image_allocate(Format::Rgba8Unorm, 8, 8, 1, 1, 1);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.hdr");
    assert!(
        ctx.image_save(id, &path, Format::Rgba32Float, 80),
        "{}",
        ctx.last_error()
    );
    let after_first = calls.load(Ordering::SeqCst);
    assert!(after_first > 0);

    // the callback removed itself, so a second conversion runs silent
    let id2 = ctx.image_allocate(Format::Rgba8Unorm, 8, 8, 1, 1, 1);
    let path2 = dir.path().join("b.hdr");
    assert!(
        ctx.image_save(id2, &path2, Format::Rgba32Float, 80),
        "{}",
        ctx.last_error()
    );
    assert_eq!(calls.load(Ordering::SeqCst), after_first);
}

#[test]
fn cancelling_save_leaves_the_texture_alone() {
    let ctx = context();
    let id = ctx.image_allocate(Format::Rgba8Unorm, 16, 16, 1, 1, 1);
    ctx.set_progress_callback(Some(Box::new(|_, _| true)));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.hdr");
    assert!(!ctx.image_save(id, &path, Format::Rgba32Float, 80));
    assert!(ctx.last_error().contains("aborted"));
    assert!(!path.exists());
    // the registry entry keeps its working format
    assert_eq!(ctx.image_info(id).unwrap().format, Format::Rgba8Unorm);
}

#[test]
fn npy_globals_steer_the_loader() {
    let ctx = context();
    // 2x2x2 u8 array; default interpretation is (h, w, c)
    let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
    let mut dict =
        b"{'descr': '|u1', 'fortran_order': False, 'shape': (2, 2, 2), }".to_vec();
    while (10 + dict.len()) % 16 != 0 {
        dict.push(b' ');
    }
    bytes.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&dict);
    bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.npy");
    std::fs::write(&path, &bytes).unwrap();

    let flat = ctx.image_open(&path);
    assert_ne!(flat, 0, "{}", ctx.last_error());
    assert_eq!(ctx.image_info(flat).unwrap().depth, 1);

    ctx.set_global_parameter("npy is3D", 1);
    let volume = ctx.image_open(&path);
    assert_ne!(volume, 0, "{}", ctx.last_error());
    assert_eq!(ctx.image_info(volume).unwrap().depth, 2);
}
