//! WGSL for presenting the software canvas.

/// Fullscreen triangle sampling the canvas texture.
///
/// The canvas is uploaded as `Rgba8UnormSrgb` and drawn into an sRGB
/// surface, so colors land on screen as the rasterizer wrote them.
pub const BLIT_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0)
var canvas: texture_2d<f32>;
@group(0) @binding(1)
var canvas_sampler: sampler;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    var uvs = array<vec2<f32>, 3>(
        vec2<f32>(0.0, 1.0),
        vec2<f32>(2.0, 1.0),
        vec2<f32>(0.0, -1.0),
    );

    var out: VertexOutput;
    out.clip_position = vec4<f32>(positions[vertex_index], 0.0, 1.0);
    out.uv = uvs[vertex_index];
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(canvas, canvas_sampler, in.uv);
    return vec4<f32>(color.rgb, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_points_present() {
        assert!(BLIT_SHADER.contains("fn vs_main"));
        assert!(BLIT_SHADER.contains("fn fs_main"));
        assert!(BLIT_SHADER.contains("@binding(1)"));
    }
}
