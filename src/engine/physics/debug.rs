use crate::core::math::Vec2;

/// Line-list vertex, laid out for direct upload to a vertex buffer
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DebugVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// What a group of debug lines shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugLayer {
    Index,
    Shapes,
    Connections,
    Contacts,
}

impl DebugLayer {
    pub const ALL: [DebugLayer; 4] = [
        DebugLayer::Index,
        DebugLayer::Shapes,
        DebugLayer::Connections,
        DebugLayer::Contacts,
    ];

    pub fn color(self) -> [f32; 4] {
        match self {
            DebugLayer::Index => [0.0, 1.0, 0.0, 0.5],       // Green
            DebugLayer::Shapes => [1.0, 1.0, 1.0, 0.9],      // White
            DebugLayer::Connections => [1.0, 1.0, 0.0, 0.9], // Yellow
            DebugLayer::Contacts => [1.0, 0.0, 0.0, 1.0],    // Red
        }
    }
}

/// Colored line list; every two vertices form one segment
#[derive(Debug, Clone)]
pub struct DebugLines {
    vertices: Vec<DebugVertex>,
    enabled: Vec<DebugLayer>,
}

impl DebugLines {
    /// Empty list accepting every layer
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            enabled: DebugLayer::ALL.to_vec(),
        }
    }

    /// Empty list accepting only `layers`
    pub fn with_layers(layers: &[DebugLayer]) -> Self {
        Self {
            vertices: Vec::new(),
            enabled: layers.to_vec(),
        }
    }

    pub fn is_enabled(&self, layer: DebugLayer) -> bool {
        self.enabled.contains(&layer)
    }

    pub fn set_enabled(&mut self, layer: DebugLayer, enabled: bool) {
        self.enabled.retain(|&l| l != layer);
        if enabled {
            self.enabled.push(layer);
        }
    }

    pub fn push_segment(&mut self, a: Vec2, b: Vec2, color: [f32; 4]) {
        for p in [a, b] {
            self.vertices.push(DebugVertex {
                position: [p.x as f32, p.y as f32],
                color,
            });
        }
    }

    /// Append `segments` in the layer's color, if the layer is enabled
    pub fn push_layer(&mut self, layer: DebugLayer, segments: impl IntoIterator<Item = (Vec2, Vec2)>) {
        if !self.is_enabled(layer) {
            return;
        }
        let color = layer.color();
        for (a, b) in segments {
            self.push_segment(a, b, color);
        }
    }

    /// Small cross centered on `point`
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn vertices(&self) -> &[DebugVertex] {
        &self.vertices
    }

    pub fn segment_count(&self) -> usize {
        self.vertices.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Raw vertex bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

impl Default for DebugLines {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<DebugVertex>(), 24);
    }

    #[test]
    fn test_push_segment() {
        let mut lines = DebugLines::new();
        lines.push_segment(Vec2::ZERO, Vec2::new(1.0, 2.0), [1.0; 4]);
        assert_eq!(lines.segment_count(), 1);
        assert_eq!(lines.vertices()[1].position, [1.0, 2.0]);
        assert_eq!(lines.as_bytes().len(), 2 * std::mem::size_of::<DebugVertex>());
    }

    #[test]
    fn test_disabled_layer_is_skipped() {
        let mut lines = DebugLines::with_layers(&[DebugLayer::Shapes]);
        lines.push_layer(DebugLayer::Index, [(Vec2::ZERO, Vec2::X)]);
        assert!(lines.is_empty());

        lines.push_layer(DebugLayer::Shapes, [(Vec2::ZERO, Vec2::X)]);
        assert_eq!(lines.vertices()[0].color, DebugLayer::Shapes.color());

        lines.set_enabled(DebugLayer::Shapes, false);
        lines.clear();
        lines.push_layer(DebugLayer::Shapes, [(Vec2::ZERO, Vec2::X)]);
        assert!(lines.is_empty());
    }
}
