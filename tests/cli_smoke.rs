use std::path::{Path, PathBuf};

use animator::{AnimationManifest, ManifestFrame, Rgba8};

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_animator")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "animator.exe"
            } else {
                "animator"
            });
            p
        })
}

fn write_png(path: &Path, w: u32, h: u32, rgba: [u8; 4]) {
    image::RgbaImage::from_pixel(w, h, image::Rgba(rgba))
        .save(path)
        .unwrap();
}

fn setup(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("cli_smoke").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    write_png(&dir.join("a.png"), 10, 10, [255, 0, 0, 255]);
    write_png(&dir.join("b.png"), 20, 10, [0, 255, 0, 255]);
    write_png(&dir.join("c.png"), 40, 20, [0, 0, 255, 255]);
    dir
}

fn write_manifest(dir: &Path) -> PathBuf {
    let manifest = AnimationManifest {
        canvas: None,
        loop_count: 0,
        rounding: Default::default(),
        fps: 30,
        background: Rgba8::BLACK,
        frames: ["a.png", "b.png", "c.png"]
            .iter()
            .map(|p| ManifestFrame {
                path: PathBuf::from(p),
                duration: 0.5,
                background: None,
                position: None,
            })
            .collect(),
    };
    let path = dir.join("manifest.json");
    let f = std::fs::File::create(&path).unwrap();
    serde_json::to_writer_pretty(f, &manifest).unwrap();
    path
}

#[test]
fn cli_render_writes_gif() {
    let dir = setup("render");
    let manifest = write_manifest(&dir);
    let out = dir.join("out.gif");
    let _ = std::fs::remove_file(&out);

    let status = std::process::Command::new(exe())
        .arg("render")
        .arg("--in")
        .arg(&manifest)
        .arg("--out")
        .arg(&out)
        .status()
        .unwrap();

    assert!(status.success());
    assert!(std::fs::read(&out).unwrap().starts_with(b"GIF89a"));
}

#[test]
fn cli_images_writes_apng() {
    let dir = setup("images");
    let out = dir.join("out.apng");
    let _ = std::fs::remove_file(&out);

    let status = std::process::Command::new(exe())
        .args(["images", "--duration", "0.25", "--background", "#ffffff", "--out"])
        .arg(&out)
        .arg(dir.join("a.png"))
        .arg(dir.join("c.png"))
        .status()
        .unwrap();

    assert!(status.success());
    assert!(std::fs::read(&out).unwrap().starts_with(b"\x89PNG"));
}

#[test]
fn cli_canvas_prints_inferred_size() {
    let dir = setup("canvas");
    let manifest = write_manifest(&dir);

    let output = std::process::Command::new(exe())
        .arg("canvas")
        .arg("--in")
        .arg(&manifest)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "40x20");
}
