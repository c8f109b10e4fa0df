//! 3.8 legacy format specifics: RGBA dark-color byte order, broadcast
//! transform mixes, packed int32 timeline colors and the trailing per-frame
//! curve byte.

use crate::binary_tests::{SkelWriter, assert_approx};
use crate::{BoneTimeline, Curve, PathConstraintTimeline, SkeletonData, SlotTimeline};

fn v38_stream() -> Vec<u8> {
    let mut w = SkelWriter::new();
    w.string(Some("abc123"));
    w.string(Some("3.8.75"));
    w.f32(0.0).f32(0.0).f32(10.0).f32(20.0);
    w.bool(false);

    // Strings: att=1.
    w.varint(1);
    w.string(Some("att"));

    // Bones.
    w.varint(1);
    w.string(Some("root"));
    w.f32(15.0).f32(1.0).f32(2.0);
    w.f32(1.0).f32(1.0).f32(0.0).f32(0.0);
    w.f32(40.0);
    w.varint(0);
    w.bool(false);

    // Slots: dark color bytes are RGBA here, not ARGB.
    w.varint(2);
    w.string(Some("tinted"));
    w.varint(0);
    w.rgba(255, 255, 255, 255);
    w.u8(10).u8(20).u8(30).u8(255); // r, g, b, a
    w.string_ref(0);
    w.varint(0);
    w.string(Some("plain"));
    w.varint(0);
    w.rgba(255, 255, 255, 255);
    w.rgba(255, 255, 255, 255); // sentinel
    w.string_ref(1);
    w.varint(1); // additive

    w.varint(0); // ik

    // Transform constraint: translate and scale mixes broadcast.
    w.varint(1);
    w.string(Some("tc"));
    w.varint(0);
    w.bool(false);
    w.varint(1).varint(0);
    w.varint(0); // target
    w.bool(false).bool(false);
    w.f32(0.0).f32(0.0).f32(0.0);
    w.f32(0.0).f32(0.0).f32(0.0);
    w.f32(0.9); // rotate
    w.f32(0.8); // translate -> x and y
    w.f32(0.7); // scale -> x and y
    w.f32(0.6); // shear y

    // Path constraint in fixed/length modes for the mix timeline below.
    w.varint(1);
    w.string(Some("pc"));
    w.varint(0);
    w.bool(false);
    w.varint(1).varint(0);
    w.varint(0); // target slot
    w.varint(0); // fixed
    w.varint(0); // length
    w.varint(0); // tangent
    w.f32(0.0);
    w.f32(2.0);
    w.f32(1.0);
    w.f32(1.0);
    w.f32(0.5); // translate mix -> x and y

    // Default skin: one unweighted mesh.
    w.varint(1);
    w.varint(0);
    w.varint(1);
    w.string_ref(1); // key "att"
    w.string_ref(0);
    w.u8(2); // mesh
    w.string_ref(0);
    w.rgba(255, 255, 255, 255);
    w.varint(2);
    w.f32(0.0).f32(0.0).f32(1.0).f32(1.0); // uvs
    w.varint(3);
    w.u8(0).u8(0).u8(0).u8(1).u8(0).u8(0); // triangles 0, 1, 0
    w.bool(false);
    w.f32(1.0).f32(2.0).f32(3.0).f32(4.0);
    w.varint(0); // hull

    w.varint(0); // named skins
    w.varint(0); // events

    // Animation without the 4.x timeline-count prefix.
    w.varint(1);
    w.string(Some("legacy"));

    // Slot timelines: a packed-int32 color timeline.
    w.varint(1);
    w.varint(0);
    w.varint(1);
    w.u8(1); // color
    w.varint(2);
    w.f32(0.0);
    w.i32(0x7F80_40FFu32 as i32); // r 127, g 128, b 64, a 255
    w.u8(2); // bezier
    w.f32(0.1).f32(0.2).f32(0.3).f32(0.4);
    w.f32(1.0);
    w.i32(0x0000_00FF);

    // Bone timelines: legacy tags 0..3 with trailing curve bytes.
    w.varint(1);
    w.varint(0);
    w.varint(2);
    w.u8(0); // rotate
    w.varint(1);
    w.f32(0.0).f32(45.0);
    w.u8(1); // translate
    w.varint(2);
    w.f32(0.0).f32(10.0).f32(20.0);
    w.u8(1); // stepped
    w.f32(0.5).f32(0.0).f32(0.0);

    w.varint(0); // ik

    // Transform timeline: broadcast mixes per frame.
    w.varint(1);
    w.varint(0);
    w.varint(1);
    w.f32(0.0);
    w.f32(1.0); // rotate
    w.f32(0.5); // translate -> x and y
    w.f32(0.25); // scale -> x and y
    w.f32(0.0); // shear

    // Path timelines: mix broadcasts translate.
    w.varint(1);
    w.varint(0);
    w.varint(1);
    w.u8(2); // mix
    w.varint(1);
    w.f32(0.0);
    w.f32(1.0); // rotate
    w.f32(0.75); // translate -> x and y

    // Deform with a trailing curve byte per frame.
    w.varint(1);
    w.varint(0);
    w.varint(1);
    w.varint(0);
    w.varint(1);
    w.string_ref(1);
    w.varint(2);
    w.f32(0.0);
    w.varint(0); // identity
    w.u8(0); // linear
    w.f32(1.0);
    w.varint(1); // end
    w.varint(0); // start
    w.f32(5.0);

    w.varint(0); // draw order
    w.varint(0); // events

    w.bytes
}

#[test]
fn legacy_stream_decodes() {
    let data = SkeletonData::from_binary(&v38_stream()).expect("parse");

    assert_eq!(data.hash.as_deref(), Some("abc123"));
    assert_eq!(data.version.as_deref(), Some("3.8.75"));

    // Dark color read in RGBA order.
    let dark = data.slots[0].dark_color.expect("dark color");
    assert_approx(dark[0], 10.0 / 255.0, 1e-6, "dark r");
    assert_approx(dark[1], 20.0 / 255.0, 1e-6, "dark g");
    assert_approx(dark[2], 30.0 / 255.0, 1e-6, "dark b");
    assert_eq!(data.slots[1].dark_color, None);
    assert_eq!(data.slots[1].attachment.as_deref(), Some("att"));

    // Broadcast mixes on the transform constraint.
    let tc = &data.transform_constraints[0];
    assert_approx(tc.mix_rotate, 0.9, 1e-6, "mix rotate");
    assert_approx(tc.mix_x, 0.8, 1e-6, "mix x");
    assert_approx(tc.mix_y, 0.8, 1e-6, "mix y equals mix x");
    assert_approx(tc.mix_scale_x, 0.7, 1e-6, "mix scale x");
    assert_approx(tc.mix_scale_y, 0.7, 1e-6, "mix scale y equals x");
    assert_approx(tc.mix_shear_y, 0.6, 1e-6, "mix shear y");

    let pc = &data.path_constraints[0];
    assert_approx(pc.mix_x, 0.5, 1e-6, "path mix x");
    assert_approx(pc.mix_y, 0.5, 1e-6, "path mix y equals x");

    let anim = data.animation("legacy").expect("animation");

    // Packed int32 color with a Bezier span curve.
    let SlotTimeline::Rgba(color) = &anim.slot_timelines[0] else {
        panic!("slot timeline must be color");
    };
    assert_approx(color.frames[0].color[0], 127.0 / 255.0, 1e-6, "r");
    assert_approx(color.frames[0].color[1], 128.0 / 255.0, 1e-6, "g");
    assert_approx(color.frames[0].color[2], 64.0 / 255.0, 1e-6, "b");
    assert_approx(color.frames[0].color[3], 1.0, 1e-6, "a");
    let Curve::Bezier { cx1, cy1, .. } = color.frames[0].curve[0] else {
        panic!("first color frame must be bezier");
    };
    assert_approx(cx1, 0.1, 1e-6, "cx1");
    assert_approx(cy1, 0.2, 1e-6, "cy1");
    // The single curve byte applies to all four channels.
    assert_eq!(color.frames[0].curve[0], color.frames[0].curve[3]);
    assert_eq!(color.frames[1].curve, [Curve::Linear; 4]);

    let BoneTimeline::Rotate(rotate) = &anim.bone_timelines[0] else {
        panic!("first bone timeline must be rotate");
    };
    assert_approx(rotate.frames[0].angle, 45.0, 1e-6, "angle");

    let BoneTimeline::Translate(translate) = &anim.bone_timelines[1] else {
        panic!("second bone timeline must be translate");
    };
    assert_eq!(translate.frames[0].curve, [Curve::Stepped; 2]);
    assert_eq!(translate.frames[1].curve, [Curve::Linear; 2]);

    let tf = &anim.transform_constraint_timelines[0].frames[0];
    assert_approx(tf.mix_x, 0.5, 1e-6, "timeline mix x");
    assert_approx(tf.mix_y, 0.5, 1e-6, "timeline mix y equals x");
    assert_approx(tf.mix_scale_x, 0.25, 1e-6, "timeline mix scale x");
    assert_approx(tf.mix_scale_y, 0.25, 1e-6, "timeline mix scale y equals x");

    let PathConstraintTimeline::Mix(mix) = &anim.path_constraint_timelines[0] else {
        panic!("path timeline must be mix");
    };
    assert_approx(mix.frames[0].mix_x, 0.75, 1e-6, "path timeline mix x");
    assert_approx(mix.frames[0].mix_y, 0.75, 1e-6, "path timeline mix y");

    // Deform identity frame equals the setup vertices; the sliced frame adds
    // on top.
    let deform = &anim.deform_timelines[0];
    assert_eq!(deform.frames[0].vertices, vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(deform.frames[1].vertices, vec![6.0, 2.0, 3.0, 4.0]);

    assert_approx(anim.duration, 1.0, 1e-6, "duration");
}

#[test]
fn legacy_streams_scale_like_new_ones() {
    let bytes = v38_stream();
    let half = SkeletonData::from_binary_with_scale(&bytes, 0.5).expect("parse at 0.5");
    let double = SkeletonData::from_binary_with_scale(&bytes, 2.0).expect("parse at 2.0");

    assert_approx(
        double.bones[0].x,
        4.0 * half.bones[0].x,
        1e-6,
        "bone x scales",
    );
    assert_approx(
        double.path_constraints[0].position,
        4.0 * half.path_constraints[0].position,
        1e-6,
        "path position scales",
    );
    assert_approx(
        double.transform_constraints[0].mix_x,
        half.transform_constraints[0].mix_x,
        1e-6,
        "mixes are unscaled",
    );
}

#[test]
fn nonessential_attachment_colors_are_packed_ints() {
    // With the nonessential flag set, 3.8 stores attachment colors as raw
    // int32s that the loader consumes without keeping.
    let mut w = SkelWriter::new();
    w.string(Some("h"));
    w.string(Some("3.8.55"));
    w.f32(0.0).f32(0.0).f32(0.0).f32(0.0);
    w.bool(true);
    w.f32(30.0); // fps
    w.string(None); // images
    w.string(None); // audio
    w.varint(1);
    w.string(Some("box"));
    w.varint(1); // bones
    w.string(Some("root"));
    w.f32(0.0).f32(0.0).f32(0.0);
    w.f32(1.0).f32(1.0).f32(0.0).f32(0.0);
    w.f32(0.0);
    w.varint(0);
    w.bool(false);
    w.i32(0x1234_5678); // packed bone color, skipped
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
    w.string_ref(1);
    w.string_ref(0);
    w.u8(1); // bounding box
    w.varint(2);
    w.bool(false);
    w.f32(0.0).f32(1.0).f32(2.0).f32(3.0);
    w.i32(0x0BAD_F00D); // packed color, skipped
    w.varint(0); // named skins
    w.varint(0); // events
    w.varint(0); // animations

    let data = SkeletonData::from_binary(&w.bytes).expect("parse");
    assert_eq!(data.bones[0].color, None);
    let bbox = data
        .default_skin()
        .and_then(|s| s.attachment(0, "box"))
        .expect("bounding box");
    let crate::AttachmentData::BoundingBox(bbox) = bbox else {
        panic!("must be a bounding box");
    };
    assert_eq!(bbox.color, None);
    assert_approx(data.fps, 30.0, 1e-6, "fps");
}
