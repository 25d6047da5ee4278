use super::*;

fn cfg(width: u32, height: u32, fps: u32) -> SinkConfig {
    SinkConfig { width, height, fps }
}

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, Rgba8::rgb(10, 20, 30)).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, Rgba8::rgb(10, 20, 30)).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_straight_half_alpha_blends() {
    let src = vec![255u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_straight_over_bg_to_opaque_rgba8(&mut dst, &src, Rgba8::rgb(0, 0, 255)).unwrap();
    assert_eq!(dst, vec![128, 0, 127, 255]);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &[0; 4], Rgba8::rgb(0, 0, 0)).is_err());
}

#[test]
fn sink_config_requires_even_nonzero_dims() {
    assert!(validate_sink_config(cfg(640, 360, 30)).is_ok());
    assert!(validate_sink_config(cfg(641, 360, 30)).is_err());
    assert!(validate_sink_config(cfg(0, 360, 30)).is_err());
    assert!(validate_sink_config(cfg(640, 360, 0)).is_err());
}

#[test]
fn args_describe_rawvideo_in_and_h264_out() {
    let args = ffmpeg_args(cfg(320, 240, 8), Path::new("out/clip.mp4"), true);
    let joined = args.join(" ");
    assert_eq!(args.first().map(String::as_str), Some("-y"));
    assert!(joined.contains("-f rawvideo -pix_fmt rgba -s 320x240 -r 8 -i pipe:0 -an"));
    assert!(joined.contains("-c:v libx264 -pix_fmt yuv420p -movflags +faststart"));
    assert_eq!(args.last().map(String::as_str), Some("out/clip.mp4"));

    let args = ffmpeg_args(cfg(320, 240, 8), Path::new("x.mp4"), false);
    assert_eq!(args.first().map(String::as_str), Some("-n"));
}

#[test]
fn stderr_tail_keeps_last_lines() {
    assert_eq!(stderr_tail("a\nb\nc\n", 2), "b\nc");
    assert_eq!(stderr_tail("", 3), "");
}

#[test]
fn push_before_begin_is_an_error() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("never.mp4"));
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 16],
        premultiplied: true,
    };
    assert!(matches!(
        sink.push_frame(0, &frame),
        Err(ChatreelError::Encode(_))
    ));
}

#[test]
fn encodes_a_short_clip_when_ffmpeg_is_available() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = std::env::temp_dir().join(format!("chatreel-ffmpeg-{}", std::process::id()));
    let out = dir.join("clip.mp4");
    let mut sink =
        FfmpegSink::new(FfmpegSinkOpts::new(&out).with_background(Rgba8::rgb(20, 20, 20)));

    sink.begin(cfg(16, 16, 8)).unwrap();
    for i in 0..8u64 {
        let frame = FrameRGBA {
            width: 16,
            height: 16,
            data: vec![(i * 30) as u8; 16 * 16 * 4],
            premultiplied: true,
        };
        sink.push_frame(i, &frame).unwrap();
    }
    sink.end().unwrap();

    assert_eq!(sink.frames_written(), 8);
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    let _ = std::fs::remove_dir_all(&dir);
}
