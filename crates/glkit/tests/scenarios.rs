//! End-to-end scenarios against the software context.

use glkit::{
    Attachment, AttachmentPoint, AttributeDesc, AttributeSet, DrawCallDesc, DrawMode, ErrorKind,
    GlKit, GlKitError, IncompleteReason, IndexType, KitConfig, SoftwareGl, TextureDesc,
    TextureFormat, UniformValue,
};

const TRIANGLE_VS: &str = "#version 300 es\n\
    in vec2 a_pos;\n\
    void main() {\n\
        gl_Position = vec4(a_pos, 0.0, 1.0);\n\
    }\n";

const TINTED_FS: &str = "#version 300 es\n\
    precision highp float;\n\
    uniform vec3 u_color;\n\
    out vec4 frag_color;\n\
    void main() {\n\
        frag_color = vec4(u_color, 1.0);\n\
    }\n";

fn kit() -> GlKit<SoftwareGl> {
    glkit::init_test_logging();
    GlKit::with_config(
        SoftwareGl::new(),
        KitConfig {
            debug: true,
            ..KitConfig::default()
        },
    )
}

fn triangle() -> AttributeSet {
    AttributeSet::new().with(
        "a_pos",
        AttributeDesc::new(&[-1.0f32, -1.0, 1.0, -1.0, 0.0, 1.0], 2),
    )
}

#[test]
fn minimal_triangle() {
    let mut kit = kit();
    let program = kit
        .create_program_from_source("triangle", TRIANGLE_VS, TINTED_FS, &[])
        .unwrap();
    let positions = kit.create_attribute_buffer("triangle", &triangle(), None).unwrap();
    let indices = kit
        .create_index_buffer("triangle", &[0, 1, 2], DrawMode::Triangles, None)
        .unwrap();

    let index_buffer = kit.index_buffer(indices).unwrap();
    assert_eq!(index_buffer.index_type, IndexType::UnsignedByte);
    assert_eq!(index_buffer.count, 3);

    let vao = kit
        .create_vertex_array("triangle", program, indices, &[positions])
        .unwrap();
    assert_eq!(kit.vertex_array(vao).unwrap().bindings.len(), 1);

    let call = kit
        .create_draw_call(DrawCallDesc::new("triangle", vao, program))
        .unwrap();
    kit.draw(&call).unwrap();

    let draws = kit.gl().draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].count, 3);
    assert_eq!(draws[0].type_, glkit::constants::UNSIGNED_BYTE);
    assert_eq!(draws[0].mode, glkit::constants::TRIANGLES);
}

#[test]
fn attribute_program_mismatch_names_the_attribute() {
    let mut kit = kit();
    let vs = "in vec3 a_pos;\nvoid main() { gl_Position = vec4(a_pos, 1.0); }";
    let program = kit.create_program_from_source("mismatch", vs, TINTED_FS, &[]).unwrap();
    let colors = kit
        .create_attribute_buffer(
            "colors",
            &AttributeSet::new().with("a_color", AttributeDesc::new(&[1.0f32; 9], 3)),
            None,
        )
        .unwrap();
    let indices = kit
        .create_index_buffer("tri", &[0, 1, 2], DrawMode::Triangles, None)
        .unwrap();
    let vao = kit
        .create_vertex_array("mismatch", program, indices, &[colors])
        .unwrap();

    let err = kit
        .create_draw_call(DrawCallDesc::new("mismatch", vao, program))
        .unwrap_err();
    match &err {
        GlKitError::MissingAttribute { attribute, .. } => assert_eq!(attribute, "a_pos"),
        other => panic!("expected a missing attribute, got {other:?}"),
    }
    assert!(err.to_string().contains("a_pos"));
}

#[test]
fn framebuffer_dimension_mismatch() {
    let mut kit = kit();
    let color = kit
        .create_texture("color", &TextureDesc::new_2d(TextureFormat::Rgba8, 256, 256))
        .unwrap();
    let depth = kit
        .create_texture("depth", &TextureDesc::new_2d(TextureFormat::Depth24, 512, 512))
        .unwrap();

    let err = kit
        .create_framebuffer(
            "offscreen",
            &[
                (AttachmentPoint::Color(0), Attachment::texture(color)),
                (AttachmentPoint::Depth, Attachment::texture(depth)),
            ],
        )
        .unwrap_err();
    assert_eq!(
        err,
        GlKitError::IncompleteFramebuffer {
            name: "offscreen".into(),
            reason: IncompleteReason::DimensionMismatch,
        }
    );
    assert_eq!(kit.stats().live.framebuffers, 0);
}

#[test]
fn index_type_selection() {
    let mut kit = kit();
    for (max, expected) in [
        (255, IndexType::UnsignedByte),
        (256, IndexType::UnsignedShort),
        (65535, IndexType::UnsignedShort),
        (65536, IndexType::UnsignedInt),
    ] {
        let id = kit
            .create_index_buffer("points", &[max], DrawMode::Points, None)
            .unwrap();
        assert_eq!(kit.index_buffer(id).unwrap().index_type, expected);
    }
    let err = kit
        .create_index_buffer("points", &[1 << 32], DrawMode::Points, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn unchanged_uniforms_are_not_reuploaded() {
    let mut kit = kit();
    let program = kit
        .create_program_from_source("tinted", TRIANGLE_VS, TINTED_FS, &[])
        .unwrap();
    let positions = kit.create_attribute_buffer("triangle", &triangle(), None).unwrap();
    let indices = kit
        .create_index_buffer("triangle", &[0, 1, 2], DrawMode::Triangles, None)
        .unwrap();
    let vao = kit
        .create_vertex_array("triangle", program, indices, &[positions])
        .unwrap();
    let mut call = kit
        .create_draw_call(DrawCallDesc::new("tinted", vao, program).uniform("u_color", [1.0f32, 0.5, 0.25]))
        .unwrap();
    kit.gl_mut().clear_uniform_uploads();

    kit.draw(&call).unwrap();
    kit.draw(&call).unwrap();
    assert_eq!(kit.gl().uniform_uploads().len(), 1);

    call.set_uniform("u_color", [1.0f32, 0.5, 0.5]).unwrap();
    kit.draw(&call).unwrap();
    kit.draw(&call).unwrap();
    assert_eq!(kit.gl().uniform_uploads().len(), 2);
    assert_eq!(
        kit.uniform_value(program, "u_color").unwrap(),
        &UniformValue::Float(vec![1.0, 0.5, 0.5])
    );
}

#[test]
fn identical_sources_share_a_program() {
    let mut kit = kit();
    let first = kit
        .create_program_from_source("a", TRIANGLE_VS, TINTED_FS, &[])
        .unwrap();
    let second = kit
        .create_program_from_source("b", TRIANGLE_VS, TINTED_FS, &[])
        .unwrap();
    assert_eq!(first, second);

    let edited = TINTED_FS.replace("1.0);", "0.9);");
    let third = kit
        .create_program_from_source("c", TRIANGLE_VS, &edited, &[])
        .unwrap();
    assert_ne!(first, third);

    let stats = kit.stats();
    assert_eq!(stats.live.programs, 2);
    // the vertex shader is shared by all three
    assert_eq!(stats.live.shaders, 3);
    assert!(stats.cache.program_hits >= 1);
}

#[test]
fn reset_without_keep_frees_everything() {
    let mut kit = kit();
    let program = kit
        .create_program_from_source("triangle", TRIANGLE_VS, TINTED_FS, &[])
        .unwrap();
    let buffer = kit.create_attribute_buffer("triangle", &triangle(), None).unwrap();

    kit.reset_context(0);

    assert_eq!(kit.stats().live.total(), 0);
    assert_eq!(kit.gl().live_objects(), 0);
    assert!(matches!(kit.program(program), Err(GlKitError::StaleHandle { .. })));
    assert!(kit.attribute_buffer(buffer).is_err());
    assert_eq!(kit.generation(), 1);
}

#[test]
fn reset_keeps_recent_programs_only() {
    let mut kit = kit();
    let program = kit
        .create_program_from_source("triangle", TRIANGLE_VS, TINTED_FS, &[])
        .unwrap();
    let buffer = kit.create_attribute_buffer("triangle", &triangle(), None).unwrap();

    kit.reset_context(1);
    assert!(kit.program(program).is_ok());
    assert!(kit.attribute_buffer(buffer).is_err());

    // not requested during generation 1, so the next reset drops it
    kit.reset_context(1);
    assert!(kit.program(program).is_err());
    assert_eq!(kit.stats().live.total(), 0);
}

#[test]
fn reused_programs_survive_resets() {
    let mut kit = kit();
    let program = kit
        .create_program_from_source("triangle", TRIANGLE_VS, TINTED_FS, &[])
        .unwrap();
    for _ in 0..3 {
        kit.reset_context(1);
        let again = kit
            .create_program_from_source("triangle", TRIANGLE_VS, TINTED_FS, &[])
            .unwrap();
        assert_eq!(again, program);
    }
}

#[test]
fn release_errors_are_redacted() {
    glkit::init_test_logging();
    let mut kit = GlKit::with_config(
        SoftwareGl::new(),
        KitConfig {
            debug: false,
            ..KitConfig::default()
        },
    );

    let err = kit
        .create_index_buffer("secret_mesh", &[0, 1], DrawMode::Triangles, None)
        .unwrap_err();
    assert_eq!(err, GlKitError::Redacted(ErrorKind::Validation));
    assert!(!err.to_string().contains("secret_mesh"));

    let err = kit
        .create_program_from_source("broken", "void nope() {}", TINTED_FS, &[])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CompileFailure);
}
