use super::*;

#[test]
fn frame_size_rejects_empty_dimensions() {
    assert!(FrameSize::new(0, 10).is_err());
    assert!(FrameSize::new(10, 0).is_err());
    assert_eq!(FrameSize::new(4, 3).unwrap().area(), 12);
}

#[test]
fn frame_index_next_saturates() {
    assert_eq!(FrameIndex(1).next(), FrameIndex(2));
    assert_eq!(FrameIndex(u64::MAX).next(), FrameIndex(u64::MAX));
}

#[test]
fn with_texture_keeps_index_and_size() {
    let size = FrameSize::new(8, 8).unwrap();
    let f = Frame::new(FrameIndex(3), size, TextureId(1)).with_texture(TextureId(9));
    assert_eq!(f.index, FrameIndex(3));
    assert_eq!(f.size, size);
    assert_eq!(f.texture, TextureId(9));
}
