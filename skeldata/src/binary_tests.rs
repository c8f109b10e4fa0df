use crate::binary::BinaryInput;
use crate::{
    AttachmentData, BlendMode, BoneTimeline, Curve, Inherit, PathConstraintTimeline,
    PhysicsConstraintTimeline, SequenceMode, SkeletonData, SlotTimeline,
};

pub(crate) fn assert_approx(a: f32, b: f32, eps: f32, ctx: &str) {
    if (a - b).abs() > eps {
        panic!("{ctx}: expected {b}, got {a} (diff {})", (a - b).abs());
    }
}

/// Writes the packed binary encoding the loaders consume.
pub(crate) struct SkelWriter {
    pub bytes: Vec<u8>,
}

impl SkelWriter {
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.bytes.push(v);
        self
    }

    pub fn bool(&mut self, v: bool) -> &mut Self {
        self.u8(v as u8)
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn varint(&mut self, v: u32) -> &mut Self {
        let mut v = v;
        loop {
            let b = (v & 0x7F) as u8;
            v >>= 7;
            if v != 0 {
                self.u8(b | 0x80);
            } else {
                self.u8(b);
                break;
            }
        }
        self
    }

    pub fn varint_signed(&mut self, v: i32) -> &mut Self {
        self.varint(((v << 1) ^ (v >> 31)) as u32)
    }

    pub fn string(&mut self, v: Option<&str>) -> &mut Self {
        match v {
            None => self.varint(0),
            Some(s) => {
                self.varint(s.len() as u32 + 1);
                self.bytes.extend_from_slice(s.as_bytes());
                self
            }
        }
    }

    /// 1-based string table reference; 0 encodes null.
    pub fn string_ref(&mut self, index: u32) -> &mut Self {
        self.varint(index)
    }

    pub fn rgba(&mut self, r: u8, g: u8, b: u8, a: u8) -> &mut Self {
        self.u8(r).u8(g).u8(b).u8(a)
    }
}

#[test]
fn varint_single_and_zigzag() {
    // 0x96 0x01 is 150 unsigned; the same bits zig-zag decode to 75.
    let bytes = [0x96u8, 0x01];
    let mut input = BinaryInput::new(&bytes);
    assert_eq!(input.read_varint(true).unwrap(), 150);
    let mut input = BinaryInput::new(&bytes);
    assert_eq!(input.read_varint(false).unwrap(), 75);
}

#[test]
fn varint_five_byte_boundary() {
    // Five bytes with all payload bits set cover the full 32-bit range.
    let bytes = [0xFFu8, 0xFF, 0xFF, 0xFF, 0x0F];
    let mut input = BinaryInput::new(&bytes);
    assert_eq!(input.read_varint(true).unwrap() as u32, u32::MAX);

    // A continuation bit on the fifth byte would name a sixth group.
    let bytes = [0x80u8, 0x80, 0x80, 0x80, 0x80, 0x01];
    let mut input = BinaryInput::new(&bytes);
    assert!(input.read_varint(true).is_err());
}

#[test]
fn varint_zigzag_negative() {
    let mut w = SkelWriter::new();
    w.varint_signed(-3);
    let mut input = BinaryInput::new(&w.bytes);
    assert_eq!(input.read_varint(false).unwrap(), -3);
}

#[test]
fn string_null_and_empty_sentinels() {
    // Length 0 is null, length 1 is the empty string.
    let mut input = BinaryInput::new(&[0x00]);
    assert_eq!(input.read_string().unwrap(), None);
    let mut input = BinaryInput::new(&[0x01]);
    assert_eq!(input.read_string().unwrap(), Some(String::new()));

    let mut w = SkelWriter::new();
    w.string(Some("abc"));
    let mut input = BinaryInput::new(&w.bytes);
    assert_eq!(input.read_string().unwrap().as_deref(), Some("abc"));
}

#[test]
fn string_ref_sentinel_and_bounds() {
    let strings = vec!["first".to_string(), "second".to_string()];
    let mut input = BinaryInput::new(&[0x00]);
    assert_eq!(input.read_string_ref(&strings).unwrap(), None);
    let mut input = BinaryInput::new(&[0x02]);
    assert_eq!(
        input.read_string_ref(&strings).unwrap().as_deref(),
        Some("second")
    );
    let mut input = BinaryInput::new(&[0x03]);
    assert!(input.read_string_ref(&strings).is_err());
}

#[test]
fn truncated_stream_is_fatal() {
    let mut input = BinaryInput::new(&[0x00, 0x01]);
    assert!(input.read_i32_be().is_err());
    let mut input = BinaryInput::new(&[]);
    assert!(input.read_u8().is_err());
}

fn empty_v40_tail(w: &mut SkelWriter) {
    w.f32(0.0).f32(0.0).f32(0.0).f32(0.0); // x, y, width, height
    w.bool(false); // nonessential
    w.varint(0); // strings
    w.varint(0); // bones
    w.varint(0); // slots
    w.varint(0); // ik
    w.varint(0); // transform
    w.varint(0); // path
    w.varint(0); // default skin slot count
    w.varint(0); // skins
    w.varint(0); // events
    w.varint(0); // animations
}

#[test]
fn minimal_v40_stream_decodes_header() {
    let mut w = SkelWriter::new();
    w.i32(0).i32(1);
    w.string(Some("4.0"));
    empty_v40_tail(&mut w);

    let data = SkeletonData::from_binary(&w.bytes).expect("parse");
    assert_eq!(data.hash.as_deref(), Some("00000001"));
    assert_eq!(data.version.as_deref(), Some("4.0"));
    assert!(data.bones.is_empty());
    assert!(data.slots.is_empty());
    assert!(data.skins.is_empty());
    assert!(data.animations.is_empty());
    assert!(data.default_skin.is_none());
}

#[test]
fn unsupported_version_is_reported_with_its_string() {
    let mut w = SkelWriter::new();
    // Keep the first byte above 0x40 so the legacy-header probe stays cold.
    w.i32(0x7F00_0000).i32(2);
    w.string(Some("9.9"));
    let err = SkeletonData::from_binary(&w.bytes).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("version"), "message: {message}");
    assert!(message.contains("9.9"), "message: {message}");
}

#[test]
fn legacy_header_is_probed_by_first_byte() {
    // The first byte is the length prefix of the hash string (3 chars + 1).
    let mut w = SkelWriter::new();
    w.string(Some("abc"));
    w.string(Some("3.8.99"));
    w.f32(0.0).f32(0.0).f32(0.0).f32(0.0);
    w.bool(false);
    w.varint(0); // strings
    w.varint(0); // bones
    w.varint(0); // slots
    w.varint(0); // ik
    w.varint(0); // transform
    w.varint(0); // path
    w.varint(0); // default skin
    w.varint(0); // skins
    w.varint(0); // events
    w.varint(0); // animations
    assert_eq!(w.bytes[0], 0x04);

    let data = SkeletonData::from_binary(&w.bytes).expect("parse");
    assert_eq!(data.hash.as_deref(), Some("abc"));
    assert_eq!(data.version.as_deref(), Some("3.8.99"));
}

#[test]
fn probe_miss_falls_through_to_the_new_layout() {
    // First byte 0x00 is <= 0x40, but the probe finds no "3.x" version and
    // the stream decodes from the start as 4.x.
    let mut w = SkelWriter::new();
    w.i32(0).i32(0x0102_0304);
    w.string(Some("4.1.15"));
    // 4.1 routes to the 4.2 reader, whose header carries a reference scale.
    w.f32(0.0).f32(0.0).f32(0.0).f32(0.0);
    w.f32(100.0);
    w.bool(false);
    w.varint(0); // strings
    w.varint(0); // bones
    w.varint(0); // slots
    w.varint(0); // ik
    w.varint(0); // transform
    w.varint(0); // path
    w.varint(0); // physics
    w.varint(0); // default skin
    w.varint(0); // skins
    w.varint(0); // events
    w.varint(0); // animations

    let data = SkeletonData::from_binary(&w.bytes).expect("parse");
    assert_eq!(data.hash.as_deref(), Some("01020304"));
    assert_eq!(data.version.as_deref(), Some("4.1.15"));
}

/// Writes a 4.0 document exercising bones, slots, constraints, skins, linked
/// meshes, events and an animation over most timeline kinds. Raw values stay
/// unscaled; the loader applies the caller's scale.
pub(crate) fn rich_v40_stream() -> Vec<u8> {
    let mut w = SkelWriter::new();
    w.i32(0x7FEE_0102).i32(0x0000_00AB);
    w.string(Some("4.0.64"));
    w.f32(1.5).f32(2.5).f32(100.0).f32(200.0);
    w.bool(false);

    // Strings: arm=1, extra=2, cloak=3, overlay=4, boom=5.
    w.varint(5);
    for s in ["arm", "extra", "cloak", "overlay", "boom"] {
        w.string(Some(s));
    }

    // Bones.
    w.varint(2);
    w.string(Some("root"));
    w.f32(45.0).f32(2.0).f32(3.0); // rotation, x, y
    w.f32(1.0).f32(1.0).f32(0.0).f32(0.0); // scale, shear
    w.f32(50.0); // length
    w.varint(0); // inherit
    w.bool(false);
    w.string(Some("limb"));
    w.varint(0); // parent
    w.f32(0.0).f32(5.0).f32(6.0);
    w.f32(1.0).f32(1.0).f32(0.0).f32(0.0);
    w.f32(25.0);
    w.varint(1); // onlyTranslation
    w.bool(false);

    // Slots.
    w.varint(2);
    w.string(Some("front"));
    w.varint(1); // bone
    w.rgba(255, 255, 255, 255);
    w.rgba(255, 255, 255, 255); // ARGB dark sentinel
    w.string_ref(1); // attachment "arm"
    w.varint(0); // blend
    w.string(Some("back"));
    w.varint(0);
    w.rgba(128, 64, 32, 255);
    w.u8(255).u8(10).u8(20).u8(30); // ARGB dark, present
    w.string_ref(0);
    w.varint(2); // multiply

    // IK.
    w.varint(1);
    w.string(Some("ik1"));
    w.varint(0); // order
    w.bool(false);
    w.varint(1).varint(1); // bones [limb]
    w.varint(0); // target root
    w.f32(0.75).f32(12.0); // mix, softness
    w.u8(0xFF); // bend direction -1
    w.bool(false).bool(true).bool(false);

    // Transform.
    w.varint(1);
    w.string(Some("tc1"));
    w.varint(1);
    w.bool(false);
    w.varint(1).varint(0);
    w.varint(1); // target limb
    w.bool(false).bool(true); // local, relative
    w.f32(10.0).f32(4.0).f32(8.0); // offsets rotation, x, y
    w.f32(0.5).f32(0.25).f32(0.0); // offset scale x/y, shear y
    w.f32(1.0).f32(0.9).f32(0.8); // mix rotate, x, y
    w.f32(0.7).f32(0.6).f32(0.5); // mix scale x/y, shear y

    // Path.
    w.varint(1);
    w.string(Some("pc1"));
    w.varint(2);
    w.bool(false);
    w.varint(1).varint(1);
    w.varint(0); // target slot "front"
    w.varint(0); // fixed
    w.varint(0); // length
    w.varint(1); // chain
    w.f32(0.0); // offset rotation
    w.f32(7.0); // position (scaled: fixed)
    w.f32(3.0); // spacing (scaled: length)
    w.f32(1.0).f32(1.0).f32(0.5);

    // Default skin: region "arm" and mesh "extra" on slot 0.
    w.varint(1);
    w.varint(0); // slot index
    w.varint(2);
    w.string_ref(1); // key "arm"
    w.string_ref(0); // name inherited from key
    w.u8(0); // region
    w.string_ref(0); // path inherited
    w.f32(30.0).f32(1.0).f32(2.0); // rotation, x, y
    w.f32(1.0).f32(1.0); // scale
    w.f32(64.0).f32(32.0); // width, height
    w.rgba(255, 255, 255, 255);
    w.string_ref(2); // key "extra"
    w.string_ref(0);
    w.u8(2); // mesh
    w.string_ref(0);
    w.rgba(255, 255, 255, 255);
    w.varint(2); // vertex count
    w.f32(0.0).f32(0.0).f32(1.0).f32(1.0); // uvs
    w.varint(3); // triangle count
    w.u8(0).u8(0).u8(0).u8(1).u8(0).u8(0); // 0, 1, 0
    w.bool(false); // unweighted
    w.f32(1.0).f32(2.0).f32(3.0).f32(4.0);
    w.varint(1); // hull, doubled on read

    // Named skin "cloak" with a linked mesh deferring to "extra".
    w.varint(1);
    w.string_ref(3);
    w.varint(1).varint(0); // bones [root]
    w.varint(1).varint(0); // ik [ik1]
    w.varint(0); // transform
    w.varint(0); // path
    w.varint(1); // slot count
    w.varint(0);
    w.varint(1);
    w.string_ref(4); // key "overlay"
    w.string_ref(0);
    w.u8(3); // linked mesh
    w.string_ref(0);
    w.rgba(255, 255, 255, 255);
    w.string_ref(0); // parent skin: default
    w.string_ref(2); // parent "extra"
    w.bool(true); // inherit timeline

    // Events.
    w.varint(1);
    w.string_ref(5); // "boom"
    w.varint_signed(-3);
    w.f32(2.5);
    w.string(Some("hit"));
    w.string(Some("boom.ogg"));
    w.f32(0.8).f32(-0.25);

    // Animations.
    w.varint(1);
    w.string(Some("act"));
    w.varint(9); // timeline count, informational

    // Slot timelines.
    w.varint(1);
    w.varint(0); // slot 0
    w.varint(2);
    w.u8(0); // attachment
    w.varint(2);
    w.f32(0.0);
    w.string_ref(1);
    w.f32(0.5);
    w.string_ref(0);
    w.u8(1); // rgba
    w.varint(2);
    w.varint(0); // bezier count
    w.f32(0.0);
    w.rgba(255, 128, 64, 255);
    w.f32(0.75);
    w.rgba(0, 0, 0, 255);
    w.u8(1); // stepped

    // Bone timelines.
    w.varint(1);
    w.varint(1); // bone "limb"
    w.varint(2);
    w.u8(0); // rotate
    w.varint(2);
    w.varint(1);
    w.f32(0.0).f32(0.0);
    w.f32(1.0).f32(90.0);
    w.u8(2); // bezier
    w.f32(0.25).f32(0.0).f32(0.75).f32(90.0);
    w.u8(1); // translate
    w.varint(1);
    w.varint(0);
    w.f32(0.25).f32(10.0).f32(20.0);

    // IK timelines.
    w.varint(1);
    w.varint(0);
    w.varint(1); // frames
    w.varint(0); // beziers
    w.f32(0.0).f32(1.0).f32(6.0);
    w.u8(1); // bend direction
    w.bool(false).bool(false);

    // Transform timelines.
    w.varint(1);
    w.varint(0);
    w.varint(1);
    w.varint(0);
    w.f32(0.5);
    w.f32(1.0).f32(0.9).f32(0.8).f32(0.7).f32(0.6).f32(0.5);

    // Path timelines.
    w.varint(1);
    w.varint(0);
    w.varint(2);
    w.u8(0); // position
    w.varint(1);
    w.varint(0);
    w.f32(0.0).f32(5.0);
    w.u8(2); // mix
    w.varint(1);
    w.varint(0);
    w.f32(0.0).f32(1.0).f32(0.5).f32(0.25);

    // Deform timelines on the default skin's mesh.
    w.varint(1);
    w.varint(0); // skin index
    w.varint(1);
    w.varint(0); // slot index
    w.varint(1);
    w.string_ref(2); // "extra"
    w.varint(2); // frames
    w.varint(0); // beziers
    w.f32(0.0);
    w.varint(0); // identity frame
    w.f32(1.25);
    w.u8(0); // linear
    w.varint(2); // end
    w.varint(1); // start
    w.f32(10.0).f32(20.0);

    // Draw order.
    w.varint(1);
    w.f32(2.0);
    w.varint(1);
    w.varint(0); // slot index
    w.varint(1); // offset

    // Events.
    w.varint(1);
    w.f32(1.75);
    w.varint(0);
    w.varint_signed(7);
    w.f32(3.5);
    w.bool(true);
    w.string(Some("boom-override"));
    w.f32(0.5).f32(0.1);

    w.bytes
}

#[test]
fn rich_v40_stream_decodes_every_section() {
    let data = SkeletonData::from_binary(&rich_v40_stream()).expect("parse");

    assert_eq!(data.hash.as_deref(), Some("7fee0102000000ab"));
    assert_eq!(data.version.as_deref(), Some("4.0.64"));
    assert_approx(data.x, 1.5, 1e-6, "x");
    assert_approx(data.height, 200.0, 1e-6, "height");

    // Bones.
    assert_eq!(data.bones.len(), 2);
    assert_eq!(data.bones[0].parent, None);
    assert_eq!(data.bones[1].parent, Some(0));
    assert_eq!(data.bones[1].inherit, Inherit::OnlyTranslation);
    assert_approx(data.bones[0].rotation, 45.0, 1e-6, "root rotation");
    assert_approx(data.bones[1].length, 25.0, 1e-6, "limb length");

    // Slots.
    assert_eq!(data.slots.len(), 2);
    assert_eq!(data.slots[0].bone, 1);
    assert_eq!(data.slots[0].dark_color, None);
    assert_eq!(data.slots[0].attachment.as_deref(), Some("arm"));
    assert_eq!(data.slots[1].blend, BlendMode::Multiply);
    let dark = data.slots[1].dark_color.expect("dark color");
    assert_approx(dark[0], 10.0 / 255.0, 1e-6, "dark r");
    assert_approx(dark[2], 30.0 / 255.0, 1e-6, "dark b");

    // Constraints reference entities by index.
    let ik = &data.ik_constraints[0];
    assert_eq!(ik.bones, vec![1]);
    assert_eq!(ik.target, 0);
    assert_eq!(ik.bend_direction, -1);
    assert!(ik.stretch);
    assert_approx(ik.softness, 12.0, 1e-6, "softness");

    let tc = &data.transform_constraints[0];
    assert!(tc.relative);
    assert_approx(tc.mix_x, 0.9, 1e-6, "mix x");
    assert_approx(tc.mix_shear_y, 0.5, 1e-6, "mix shear y");

    let pc = &data.path_constraints[0];
    assert_eq!(pc.target, 0);
    assert_approx(pc.position, 7.0, 1e-6, "position");
    assert_approx(pc.mix_y, 0.5, 1e-6, "path mix y");

    // Skins.
    assert_eq!(data.skins.len(), 2);
    assert_eq!(data.default_skin, Some(0));
    let default = data.default_skin().expect("default skin");
    let arm = default.attachment(0, "arm").expect("arm attachment");
    let AttachmentData::Region(region) = arm else {
        panic!("arm must be a region");
    };
    assert_approx(region.width, 64.0, 1e-6, "region width");
    assert_approx(region.rotation, 30.0, 1e-6, "region rotation");

    let cloak = data.skin("cloak").expect("cloak skin");
    assert_eq!(cloak.bones, vec![0]);
    assert_eq!(cloak.ik_constraints, vec![0]);

    // Linked mesh closure: geometry copied, parent recorded, timeline
    // attachment inherited.
    let overlay = cloak.attachment(0, "overlay").expect("overlay");
    let AttachmentData::Mesh(overlay) = overlay else {
        panic!("overlay must be a mesh");
    };
    assert_eq!(
        overlay.parent,
        Some(("default".to_string(), "extra".to_string()))
    );
    assert_eq!(overlay.triangles, vec![0, 1, 0]);
    assert_eq!(overlay.uvs.len(), 4);
    assert_eq!(overlay.timeline_skin, "default");
    assert_eq!(overlay.timeline_attachment, "extra");

    // Events.
    let boom = data.event("boom").expect("event");
    assert_eq!(boom.int_value, -3);
    assert_eq!(boom.string_value, "hit");
    assert_eq!(boom.audio_path, "boom.ogg");
    assert_approx(boom.balance, -0.25, 1e-6, "balance");

    // Animation.
    let anim = data.animation("act").expect("animation");
    assert_approx(anim.duration, 2.0, 1e-6, "duration");

    assert_eq!(anim.slot_timelines.len(), 2);
    let SlotTimeline::Attachment(attachment) = &anim.slot_timelines[0] else {
        panic!("first slot timeline must be attachment");
    };
    assert_eq!(attachment.frames[0].name.as_deref(), Some("arm"));
    assert_eq!(attachment.frames[1].name, None);
    let SlotTimeline::Rgba(rgba) = &anim.slot_timelines[1] else {
        panic!("second slot timeline must be rgba");
    };
    assert_eq!(rgba.frames.len(), 2);
    assert_eq!(rgba.frames[0].curve, [Curve::Stepped; 4]);
    assert_approx(rgba.frames[0].color[1], 128.0 / 255.0, 1e-6, "rgba g");

    let BoneTimeline::Rotate(rotate) = &anim.bone_timelines[0] else {
        panic!("first bone timeline must be rotate");
    };
    assert_eq!(rotate.bone_index, 1);
    let Curve::Bezier { cx1, cy2, .. } = rotate.frames[0].curve else {
        panic!("rotate frame 0 must be bezier");
    };
    assert_approx(cx1, 0.25, 1e-6, "cx1");
    assert_approx(cy2, 90.0, 1e-6, "cy2");
    assert_eq!(rotate.frames[1].curve, Curve::Linear);

    let BoneTimeline::Translate(translate) = &anim.bone_timelines[1] else {
        panic!("second bone timeline must be translate");
    };
    assert_approx(translate.frames[0].x, 10.0, 1e-6, "translate x");

    let ik_tl = &anim.ik_constraint_timelines[0];
    assert_eq!(ik_tl.constraint_index, 0);
    assert_approx(ik_tl.frames[0].softness, 6.0, 1e-6, "ik timeline softness");

    let tf_tl = &anim.transform_constraint_timelines[0];
    assert_approx(tf_tl.frames[0].mix_scale_y, 0.6, 1e-6, "tf mix scale y");

    assert_eq!(anim.path_constraint_timelines.len(), 2);
    let PathConstraintTimeline::Position(pos) = &anim.path_constraint_timelines[0] else {
        panic!("first path timeline must be position");
    };
    assert_approx(pos.frames[0].value, 5.0, 1e-6, "path position");
    let PathConstraintTimeline::Mix(mix) = &anim.path_constraint_timelines[1] else {
        panic!("second path timeline must be mix");
    };
    assert_approx(mix.frames[0].mix_y, 0.25, 1e-6, "path mix y frame");

    // Deform: the identity frame equals the setup vertices; the sliced frame
    // adds the delta on top of them.
    let deform = &anim.deform_timelines[0];
    assert_eq!(deform.skin, "default");
    assert_eq!(deform.attachment, "extra");
    assert_eq!(deform.frames[0].vertices, vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(deform.frames[1].vertices, vec![1.0, 12.0, 23.0, 4.0]);

    // Draw order: one offset moving slot 0 one position later.
    let draw_order = anim.draw_order_timeline.as_ref().expect("draw order");
    assert_eq!(
        draw_order.frames[0].draw_order.as_deref(),
        Some([1usize, 0].as_slice())
    );

    // Events: keyed values override the definition; the inline string
    // replaces the default; audio keeps volume and balance.
    let events = anim.event_timeline.as_ref().expect("events");
    let frame = &events.events[0];
    assert_eq!(frame.data, 0);
    assert_eq!(frame.int_value, 7);
    assert_eq!(frame.string_value, "boom-override");
    assert_approx(frame.volume, 0.5, 1e-6, "event volume");
}

#[test]
fn draw_order_offsets_rebuild_a_permutation() {
    // Four slots, one offset: slot 1 shifts two positions later and the
    // unchanged slots fill the holes in order.
    let mut w = SkelWriter::new();
    w.i32(0x7F00_0000).i32(3);
    w.string(Some("4.0"));
    w.f32(0.0).f32(0.0).f32(0.0).f32(0.0);
    w.bool(false);
    w.varint(0); // strings
    w.varint(4); // bones
    for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
        w.string(Some(name));
        if i > 0 {
            w.varint(0);
        }
        w.f32(0.0).f32(0.0).f32(0.0);
        w.f32(1.0).f32(1.0).f32(0.0).f32(0.0);
        w.f32(0.0);
        w.varint(0);
        w.bool(false);
    }
    w.varint(4); // slots
    for name in ["s0", "s1", "s2", "s3"] {
        w.string(Some(name));
        w.varint(0);
        w.rgba(255, 255, 255, 255);
        w.rgba(255, 255, 255, 255);
        w.string_ref(0);
        w.varint(0);
    }
    w.varint(0); // ik
    w.varint(0); // transform
    w.varint(0); // path
    w.varint(0); // default skin
    w.varint(0); // skins
    w.varint(0); // events
    w.varint(1); // animations
    w.string(Some("order"));
    w.varint(1);
    w.varint(0); // slot timelines
    w.varint(0); // bone timelines
    w.varint(0); // ik
    w.varint(0); // transform
    w.varint(0); // path
    w.varint(0); // deform
    w.varint(1); // draw order frames
    w.f32(0.0);
    w.varint(1); // offset count
    w.varint(1); // slot index
    w.varint(2); // offset
    w.varint(0); // events

    let data = SkeletonData::from_binary(&w.bytes).expect("parse");
    let anim = &data.animations[0];
    let frame = &anim.draw_order_timeline.as_ref().expect("draw order").frames[0];
    let order = frame.draw_order.as_ref().expect("permutation");

    assert_eq!(order, &vec![0, 2, 3, 1]);
    // Every frame is a full permutation with no hole left behind.
    let mut seen = vec![false; 4];
    for &slot in order {
        assert!(!seen[slot], "duplicate slot {slot}");
        seen[slot] = true;
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn out_of_range_slot_bone_is_fatal() {
    let mut w = SkelWriter::new();
    w.i32(0x7F00_0000).i32(4);
    w.string(Some("4.0"));
    w.f32(0.0).f32(0.0).f32(0.0).f32(0.0);
    w.bool(false);
    w.varint(0); // strings
    w.varint(1); // bones
    w.string(Some("root"));
    w.f32(0.0).f32(0.0).f32(0.0);
    w.f32(1.0).f32(1.0).f32(0.0).f32(0.0);
    w.f32(0.0);
    w.varint(0);
    w.bool(false);
    w.varint(1); // slots
    w.string(Some("bad"));
    w.varint(7); // bone index out of range

    let err = SkeletonData::from_binary(&w.bytes).unwrap_err();
    assert!(err.to_string().contains("out of range"), "{err}");
}

#[test]
fn nonessential_header_fields_are_gated() {
    let mut w = SkelWriter::new();
    w.i32(0x7F00_0000).i32(5);
    w.string(Some("4.0"));
    w.f32(0.0).f32(0.0).f32(0.0).f32(0.0);
    w.bool(true);
    w.f32(24.0); // fps
    w.string(Some("./images/"));
    w.string(Some("./audio/"));
    w.varint(0); // strings
    w.varint(1); // bones
    w.string(Some("root"));
    w.f32(0.0).f32(0.0).f32(0.0);
    w.f32(1.0).f32(1.0).f32(0.0).f32(0.0);
    w.f32(0.0);
    w.varint(0);
    w.bool(false);
    w.rgba(255, 0, 0, 255); // bone color, nonessential only
    w.varint(0); // slots
    w.varint(0); // ik
    w.varint(0); // transform
    w.varint(0); // path
    w.varint(0); // default skin
    w.varint(0); // skins
    w.varint(0); // events
    w.varint(0); // animations

    let data = SkeletonData::from_binary(&w.bytes).expect("parse");
    assert_approx(data.fps, 24.0, 1e-6, "fps");
    assert_eq!(data.images_path.as_deref(), Some("./images/"));
    assert_eq!(data.audio_path.as_deref(), Some("./audio/"));
    let color = data.bones[0].color.expect("bone color");
    assert_approx(color[0], 1.0, 1e-6, "bone color r");
    assert_approx(color[1], 0.0, 1e-6, "bone color g");
}

#[test]
fn duration_is_the_maximum_keyed_time() {
    let data = SkeletonData::from_binary(&rich_v40_stream()).expect("parse");
    let anim = data.animation("act").expect("animation");

    let mut max_time = 0.0f32;
    for timeline in &anim.slot_timelines {
        let last = match timeline {
            SlotTimeline::Attachment(t) => t.frames.last().map(|f| f.time),
            SlotTimeline::Rgba(t) => t.frames.last().map(|f| f.time),
            _ => None,
        };
        max_time = max_time.max(last.unwrap_or(0.0));
    }
    if let Some(t) = anim.draw_order_timeline.as_ref() {
        max_time = max_time.max(t.frames.last().map(|f| f.time).unwrap_or(0.0));
    }
    if let Some(t) = anim.event_timeline.as_ref() {
        max_time = max_time.max(t.events.last().map(|e| e.time).unwrap_or(0.0));
    }
    assert!(anim.duration >= max_time);
    assert_approx(anim.duration, 2.0, 1e-6, "duration equals max");
}

/// Writes a 4.2 document with physics, sequences, inherit and per-kind
/// attachment timelines.
fn v42_stream() -> Vec<u8> {
    let mut w = SkelWriter::new();
    w.i32(0x7F00_0042).i32(0x42);
    w.string(Some("4.2.11"));
    w.f32(0.0).f32(0.0).f32(50.0).f32(60.0);
    w.f32(150.0); // reference scale
    w.bool(false);

    // Strings: spr=1.
    w.varint(1);
    w.string(Some("spr"));

    // Bones.
    w.varint(1);
    w.string(Some("root"));
    w.f32(0.0).f32(0.0).f32(0.0);
    w.f32(1.0).f32(1.0).f32(0.0).f32(0.0);
    w.f32(0.0);
    w.varint(0);
    w.bool(false);

    // Slots.
    w.varint(1);
    w.string(Some("s0"));
    w.varint(0);
    w.rgba(255, 255, 255, 255);
    w.rgba(255, 255, 255, 255);
    w.string_ref(0);
    w.varint(0);

    w.varint(0); // ik
    w.varint(0); // transform
    w.varint(0); // path

    // Physics.
    w.varint(1);
    w.string(Some("phys"));
    w.varint(0); // order
    w.varint(0); // bone
    w.u8(1 | 2 | 128); // skin required, x keyed, mass inverse keyed
    w.f32(1.5); // x
    w.u8(60); // step divisor
    w.f32(0.9).f32(50.0).f32(0.85); // inertia, strength, damping
    w.f32(0.5); // mass inverse
    w.f32(1.0).f32(9.8); // wind, gravity
    w.u8(1 | 128); // inertia global, mix keyed
    w.f32(0.7); // mix

    // Default skin: one region with a sequence.
    w.varint(1);
    w.varint(0);
    w.varint(1);
    w.string_ref(1); // key "spr"
    w.string_ref(0);
    w.u8(0); // region
    w.string_ref(0);
    w.f32(0.0).f32(0.0).f32(0.0);
    w.f32(1.0).f32(1.0);
    w.f32(10.0).f32(12.0);
    w.rgba(255, 255, 255, 255);
    w.bool(true); // sequence present
    w.varint(4); // count
    w.varint(1); // start
    w.varint(2); // digits
    w.varint(0); // setup index

    w.varint(0); // named skins

    // Events: names are inline strings in 4.2.
    w.varint(1);
    w.string(Some("snd"));
    w.varint_signed(0);
    w.f32(0.0);
    w.string(None);
    w.string(None);

    // Animations.
    w.varint(1);
    w.string(Some("a42"));
    w.varint(4);

    w.varint(0); // slot timelines

    // Bone timelines: inherit.
    w.varint(1);
    w.varint(0);
    w.varint(1);
    w.u8(10); // inherit
    w.varint(1);
    w.f32(0.0);
    w.u8(2); // noRotationOrReflection

    w.varint(0); // ik
    w.varint(0); // transform
    w.varint(0); // path

    // Physics timelines; subject 0 keys every constraint.
    w.varint(1);
    w.varint(0);
    w.varint(2);
    w.u8(0); // inertia
    w.varint(1);
    w.varint(0);
    w.f32(0.0).f32(0.5);
    w.u8(8); // reset
    w.varint(1);
    w.f32(0.25);

    // Attachment timelines: a sequence timeline on the region.
    w.varint(1);
    w.varint(0); // skin
    w.varint(1);
    w.varint(0); // slot
    w.varint(1);
    w.string_ref(1); // "spr"
    w.u8(1); // sequence
    w.varint(1);
    w.f32(0.5);
    w.i32((3 << 4) | 2); // index 3, loop
    w.f32(0.1);

    w.varint(0); // draw order

    // Events.
    w.varint(1);
    w.f32(1.0);
    w.varint(0);
    w.varint_signed(5);
    w.f32(1.5);
    w.bool(false);

    w.bytes
}

#[test]
fn v42_stream_decodes_physics_sequences_and_inherit() {
    let data = SkeletonData::from_binary(&v42_stream()).expect("parse");

    assert_eq!(data.version.as_deref(), Some("4.2.11"));
    assert_approx(data.reference_scale, 150.0, 1e-6, "reference scale");

    let phys = &data.physics_constraints[0];
    assert!(phys.skin_required);
    assert_approx(phys.x, 1.5, 1e-6, "physics x");
    assert_approx(phys.limit, 5000.0, 1e-3, "physics limit default");
    assert_approx(phys.step, 1.0 / 60.0, 1e-6, "physics step");
    assert_approx(phys.mass_inverse, 0.5, 1e-6, "mass inverse");
    assert_approx(phys.mix, 0.7, 1e-6, "physics mix");
    assert!(phys.inertia_global);
    assert!(!phys.wind_global);

    let region = data
        .default_skin()
        .and_then(|s| s.attachment(0, "spr"))
        .expect("region");
    let AttachmentData::Region(region) = region else {
        panic!("spr must be a region");
    };
    let sequence = region.sequence.as_ref().expect("sequence");
    assert_eq!(sequence.count, 4);
    assert_eq!(sequence.start, 1);
    assert_eq!(sequence.digits, 2);

    assert_eq!(data.events[0].name, "snd");

    let anim = data.animation("a42").expect("animation");
    let BoneTimeline::Inherit(inherit) = &anim.bone_timelines[0] else {
        panic!("bone timeline must be inherit");
    };
    assert_eq!(
        inherit.frames[0].inherit,
        Inherit::NoRotationOrReflection
    );

    assert_eq!(anim.physics_constraint_timelines.len(), 2);
    let PhysicsConstraintTimeline::Inertia(inertia) = &anim.physics_constraint_timelines[0] else {
        panic!("first physics timeline must be inertia");
    };
    assert_eq!(inertia.constraint_index, -1);
    assert_approx(inertia.frames[0].value, 0.5, 1e-6, "inertia value");
    let PhysicsConstraintTimeline::Reset(reset) = &anim.physics_constraint_timelines[1] else {
        panic!("second physics timeline must be reset");
    };
    assert_eq!(reset.constraint_index, -1);
    assert_approx(reset.frames[0], 0.25, 1e-6, "reset time");

    let sequence_tl = &anim.sequence_timelines[0];
    assert_eq!(sequence_tl.attachment, "spr");
    assert_eq!(sequence_tl.frames[0].mode, SequenceMode::Loop);
    assert_eq!(sequence_tl.frames[0].index, 3);
    assert_approx(sequence_tl.frames[0].delay, 0.1, 1e-6, "sequence delay");

    assert_approx(anim.duration, 1.0, 1e-6, "duration");
}

#[test]
fn deform_identity_and_slice_frames_for_weighted_mesh() {
    // A weighted mesh's identity deform frame is all zeros (offsets), and a
    // sliced frame leaves components outside the slice untouched.
    let mut w = SkelWriter::new();
    w.i32(0x7F00_0000).i32(9);
    w.string(Some("4.0"));
    w.f32(0.0).f32(0.0).f32(0.0).f32(0.0);
    w.bool(false);
    w.varint(1);
    w.string(Some("m"));
    w.varint(1); // bones
    w.string(Some("root"));
    w.f32(0.0).f32(0.0).f32(0.0);
    w.f32(1.0).f32(1.0).f32(0.0).f32(0.0);
    w.f32(0.0);
    w.varint(0);
    w.bool(false);
    w.varint(1); // slots
    w.string(Some("s0"));
    w.varint(0);
    w.rgba(255, 255, 255, 255);
    w.rgba(255, 255, 255, 255);
    w.string_ref(0);
    w.varint(0);
    w.varint(0); // ik
    w.varint(0); // transform
    w.varint(0); // path
    w.varint(1); // default skin
    w.varint(0);
    w.varint(1);
    w.string_ref(1); // key "m"
    w.string_ref(0);
    w.u8(2); // mesh
    w.string_ref(0);
    w.rgba(255, 255, 255, 255);
    w.varint(2); // vertices
    w.f32(0.0).f32(0.0).f32(1.0).f32(1.0); // uvs
    w.varint(0); // triangles
    w.bool(true); // weighted
    // Vertex 0: one influence. Vertex 1: one influence.
    w.varint(1);
    w.varint(0);
    w.f32(1.0).f32(2.0).f32(1.0);
    w.varint(1);
    w.varint(0);
    w.f32(3.0).f32(4.0).f32(1.0);
    w.varint(0); // hull
    w.varint(0); // named skins
    w.varint(0); // events
    w.varint(1); // animations
    w.string(Some("bend"));
    w.varint(1);
    w.varint(0); // slots
    w.varint(0); // bones
    w.varint(0); // ik
    w.varint(0); // transform
    w.varint(0); // path
    w.varint(1); // deform skins
    w.varint(0);
    w.varint(1);
    w.varint(0);
    w.varint(1);
    w.string_ref(1);
    w.varint(2); // frames
    w.varint(0); // beziers
    w.f32(0.0);
    w.varint(0); // identity
    w.f32(1.0);
    w.u8(0);
    w.varint(1); // end
    w.varint(2); // start
    w.f32(9.0);
    w.varint(0); // draw order
    w.varint(0); // events

    let data = SkeletonData::from_binary(&w.bytes).expect("parse");
    let deform = &data.animations[0].deform_timelines[0];
    // Two weights, two components each.
    assert_eq!(deform.frames[0].vertices, vec![0.0, 0.0, 0.0, 0.0]);
    assert_eq!(deform.frames[1].vertices, vec![0.0, 0.0, 9.0, 0.0]);
}

#[test]
fn missing_deform_attachment_is_fatal() {
    let mut w = SkelWriter::new();
    w.i32(0x7F00_0000).i32(10);
    w.string(Some("4.0"));
    w.f32(0.0).f32(0.0).f32(0.0).f32(0.0);
    w.bool(false);
    w.varint(1);
    w.string(Some("ghost"));
    w.varint(1); // bones
    w.string(Some("root"));
    w.f32(0.0).f32(0.0).f32(0.0);
    w.f32(1.0).f32(1.0).f32(0.0).f32(0.0);
    w.f32(0.0);
    w.varint(0);
    w.bool(false);
    w.varint(1); // slots
    w.string(Some("s0"));
    w.varint(0);
    w.rgba(255, 255, 255, 255);
    w.rgba(255, 255, 255, 255);
    w.string_ref(0);
    w.varint(0);
    w.varint(0); // ik
    w.varint(0); // transform
    w.varint(0); // path
    w.varint(1); // default skin with one empty slot entry
    w.varint(0);
    w.varint(0);
    w.varint(0); // named skins
    w.varint(0); // events
    w.varint(1); // animations
    w.string(Some("x"));
    w.varint(0);
    w.varint(0); // slots
    w.varint(0); // bones
    w.varint(0); // ik
    w.varint(0); // transform
    w.varint(0); // path
    w.varint(1); // deform skins
    w.varint(0);
    w.varint(1);
    w.varint(0);
    w.varint(1);
    w.string_ref(1); // "ghost" was never attached

    let err = SkeletonData::from_binary(&w.bytes).unwrap_err();
    assert!(
        err.to_string().contains("attachment not found"),
        "{err}"
    );
}

#[test]
fn linked_mesh_with_missing_parent_is_fatal() {
    let mut w = SkelWriter::new();
    w.i32(0x7F00_0000).i32(11);
    w.string(Some("4.0"));
    w.f32(0.0).f32(0.0).f32(0.0).f32(0.0);
    w.bool(false);
    w.varint(2);
    w.string(Some("link"));
    w.string(Some("nope"));
    w.varint(1); // bones
    w.string(Some("root"));
    w.f32(0.0).f32(0.0).f32(0.0);
    w.f32(1.0).f32(1.0).f32(0.0).f32(0.0);
    w.f32(0.0);
    w.varint(0);
    w.bool(false);
    w.varint(1); // slots
    w.string(Some("s0"));
    w.varint(0);
    w.rgba(255, 255, 255, 255);
    w.rgba(255, 255, 255, 255);
    w.string_ref(0);
    w.varint(0);
    w.varint(0); // ik
    w.varint(0); // transform
    w.varint(0); // path
    w.varint(1); // default skin
    w.varint(0);
    w.varint(1);
    w.string_ref(1); // key "link"
    w.string_ref(0);
    w.u8(3); // linked mesh
    w.string_ref(0);
    w.rgba(255, 255, 255, 255);
    w.string_ref(0); // parent skin: default
    w.string_ref(2); // parent "nope"
    w.bool(false);
    w.varint(0); // named skins

    let err = SkeletonData::from_binary(&w.bytes).unwrap_err();
    assert!(err.to_string().contains("parent mesh not found"), "{err}");
}
