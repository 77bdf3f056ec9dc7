/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Point3, Vector3};
use solidview_core::{ClipPlane, DrawItem, Frame, LineSet, Mesh, Primitive, Side};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Lines are pulled this far toward the viewer so outlines win over faces
const LINE_DEPTH_BIAS: f32 = 1e-3;

type ScreenPoint = (f32, f32, f32);

/// ASCII renderer that converts frames to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<Color>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![Color::Reset; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill(Color::Reset);
    }

    /// Character at a cell, for inspection
    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    /// Rasterize every item of a frame into the buffers
    pub fn render_frame(&mut self, frame: &Frame<'_>) {
        self.clear();
        let view_projection = frame.camera.view_projection();

        // Opaque surfaces first so transparent ones can test against them
        let (transparent, opaque): (Vec<&DrawItem<'_>>, Vec<&DrawItem<'_>>) = frame
            .items
            .iter()
            .partition(|item| item.material.is_transparent());

        for item in opaque.into_iter().chain(transparent) {
            match item.primitive {
                Primitive::Triangles(mesh) => self.render_mesh(mesh, item, frame, &view_projection),
                Primitive::Lines(lines) => self.render_lines(lines, item, &view_projection),
            }
        }
    }

    fn project(&self, point: &Point3<f32>, frame: &Frame<'_>, vp: &Matrix4<f32>) -> Option<ScreenPoint> {
        frame
            .camera
            .project_to_screen(point, vp, self.width as u32, self.height as u32)
    }

    fn render_mesh(&mut self, mesh: &Mesh, item: &DrawItem<'_>, frame: &Frame<'_>, vp: &Matrix4<f32>) {
        let material = item.material;
        for triangle in &mesh.triangles {
            let world = triangle
                .vertices
                .map(|vertex| item.model.transform_point(&vertex.position));

            let Some(mut normal) = (world[1] - world[0])
                .cross(&(world[2] - world[0]))
                .try_normalize(1e-12)
            else {
                continue;
            };
            let centroid = Point3::from((world[0].coords + world[1].coords + world[2].coords) / 3.0);
            let facing = normal.dot(&(frame.camera.position - centroid)) > 0.0;
            match (material.side, facing) {
                (Side::Front, false) | (Side::Back, true) => continue,
                (_, false) => normal = -normal,
                _ => {}
            }

            let mut screen = [(0.0, 0.0, 0.0); 3];
            let mut visible = true;
            for (slot, point) in screen.iter_mut().zip(&world) {
                match self.project(point, frame, vp) {
                    Some(projected) => *slot = projected,
                    None => visible = false,
                }
            }
            if !visible {
                continue;
            }

            let brightness = shade(&normal, frame) * material.opacity.max(0.3);
            let character = ramp(brightness);
            let color = tint(material.color, brightness.max(0.35));
            self.rasterize_triangle(
                &screen,
                &world,
                material.clip.as_ref(),
                character,
                color,
                !material.is_transparent(),
            );
        }
    }

    fn rasterize_triangle(
        &mut self,
        coords: &[ScreenPoint; 3],
        world: &[Point3<f32>; 3],
        clip: Option<&ClipPlane>,
        character: char,
        color: Color,
        write_depth: bool,
    ) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                if let Some(plane) = clip {
                    let point = Point3::from(
                        world[0].coords * w0 + world[1].coords * w1 + world[2].coords * w2,
                    );
                    if !plane.keeps(&point) {
                        continue;
                    }
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    if write_depth {
                        self.depth_buffer[idx] = depth;
                    }
                    self.char_buffer[idx] = character;
                    self.color_buffer[idx] = color;
                }
            }
        }
    }

    fn render_lines(&mut self, lines: &LineSet, item: &DrawItem<'_>, vp: &Matrix4<f32>) {
        let color = tint(item.material.color, item.material.opacity.max(0.4));
        for [a, b] in &lines.segments {
            let mut a = item.model.transform_point(a);
            let mut b = item.model.transform_point(b);
            if let Some(plane) = &item.material.clip {
                match clip_segment(plane, a, b) {
                    Some((ca, cb)) => (a, b) = (ca, cb),
                    None => continue,
                }
            }

            let to_screen = |p: &Point3<f32>| {
                let clip = vp * p.to_homogeneous();
                (clip.w.abs() > 1e-6).then(|| {
                    (
                        (clip.x / clip.w + 1.0) * 0.5 * self.width as f32,
                        (1.0 - clip.y / clip.w) * 0.5 * self.height as f32,
                        clip.z / clip.w,
                    )
                })
            };
            let (Some(sa), Some(sb)) = (to_screen(&a), to_screen(&b)) else {
                continue;
            };
            self.rasterize_line(sa, sb, color);
        }
    }

    fn rasterize_line(&mut self, a: ScreenPoint, b: ScreenPoint, color: Color) {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0);
        if steps > 4.0 * (self.width + self.height) as f32 {
            return;
        }
        let character = line_char(dx, dy);

        for i in 0..=steps as usize {
            let t = i as f32 / steps;
            let x = (a.0 + dx * t).floor();
            let y = (a.1 + dy * t).floor();
            let depth = a.2 + (b.2 - a.2) * t;
            if x < 0.0 || y < 0.0 || x >= self.width as f32 || y >= self.height as f32 {
                continue;
            }
            if !(-1.0..=1.0).contains(&depth) {
                continue;
            }
            let idx = y as usize * self.width + x as usize;
            if depth - LINE_DEPTH_BIAS <= self.depth_buffer[idx] {
                self.char_buffer[idx] = character;
                self.color_buffer[idx] = color;
            }
        }
    }

    /// Queue the buffer at a terminal position
    pub fn draw<W: Write>(&self, writer: &mut W, origin: (u16, u16)) -> std::io::Result<()> {
        let mut current = None;
        for y in 0..self.height {
            writer.queue(MoveTo(origin.0, origin.1 + y as u16))?;
            for x in 0..self.width {
                let idx = y * self.width + x;
                let color = self.color_buffer[idx];
                if current != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                writer.queue(Print(self.char_buffer[idx]))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Lambert shading from the scene lights, in 0..=1
fn shade(normal: &Vector3<f32>, frame: &Frame<'_>) -> f32 {
    let diffuse: f32 = frame
        .lights
        .iter()
        .map(|light| light.intensity * normal.dot(&light.direction).max(0.0))
        .sum();
    (frame.ambient * 0.5 + diffuse).clamp(0.0, 1.0)
}

fn ramp(brightness: f32) -> char {
    // Skip the blank so a lit face never vanishes
    let last = LUMINOSITY_RAMP.len() - 1;
    let index = 1 + (brightness * (last - 1) as f32).round() as usize;
    LUMINOSITY_RAMP[index.min(last)]
}

fn tint(color: [f32; 3], brightness: f32) -> Color {
    let channel = |c: f32| (c * brightness * 255.0).clamp(0.0, 255.0) as u8;
    Color::Rgb {
        r: channel(color[0]),
        g: channel(color[1]),
        b: channel(color[2]),
    }
}

/// Pick a glyph that follows the on-screen slope (cells are twice as tall)
fn line_char(dx: f32, dy: f32) -> char {
    let slope = (dy * 2.0).atan2(dx).to_degrees().rem_euclid(180.0);
    match slope {
        s if !(22.5..157.5).contains(&s) => '-',
        s if s < 67.5 => '\\',
        s if s < 112.5 => '|',
        _ => '/',
    }
}

/// Cut a segment down to the kept side of a clip plane
fn clip_segment(
    plane: &ClipPlane,
    a: Point3<f32>,
    b: Point3<f32>,
) -> Option<(Point3<f32>, Point3<f32>)> {
    let (da, db) = (plane.signed_distance(&a), plane.signed_distance(&b));
    match (da <= 0.0, db <= 0.0) {
        (true, true) => Some((a, b)),
        (false, false) => None,
        _ => {
            let t = da / (da - db);
            let cut = a + (b - a) * t;
            if da <= 0.0 {
                Some((a, cut))
            } else {
                Some((cut, b))
            }
        }
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solidview_core::{
        OrthoView, RenderSurface, ShapeDescriptor, ShapeFactory, ViewCoordinator, ViewId,
        VisualizerConfig,
    };
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Pane(Rc<RefCell<AsciiRenderer>>);

    impl RenderSurface for Pane {
        fn size(&self) -> (u32, u32) {
            let renderer = self.0.borrow();
            (renderer.width() as u32, renderer.height() as u32 * 2)
        }

        fn present(&mut self, frame: &Frame<'_>) {
            self.0.borrow_mut().render_frame(frame);
        }
    }

    #[test]
    fn test_barycentric_corners() {
        let (w0, w1, w2) = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (0.0, 0.0)).unwrap();
        assert!((w0 - 1.0).abs() < 1e-6 && w1.abs() < 1e-6 && w2.abs() < 1e-6);
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)).is_none());
    }

    #[test]
    fn test_line_glyphs() {
        assert_eq!(line_char(1.0, 0.0), '-');
        assert_eq!(line_char(0.0, 1.0), '|');
        assert_eq!(line_char(-3.0, 0.1), '-');
    }

    #[test]
    fn test_clip_segment_keeps_lower_half() {
        let plane = ClipPlane {
            normal: Vector3::y(),
            offset: 0.0,
        };
        let (a, b) = clip_segment(
            &plane,
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert_eq!(a, Point3::new(0.0, -1.0, 0.0));
        assert!(b.y.abs() < 1e-6);
        let above = clip_segment(&plane, Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, 2.0, 0.0));
        assert!(above.is_none());
    }

    #[test]
    fn test_ortho_view_draws_shape_at_center() {
        let renderer = Rc::new(RefCell::new(AsciiRenderer::new(40, 20)));
        let mut views = ViewCoordinator::new(&VisualizerConfig::default());
        views.register(ViewId::Ortho(OrthoView::Front), Box::new(Pane(Rc::clone(&renderer))));
        let bundle = ShapeFactory::default()
            .build(&ShapeDescriptor::cube(3.0))
            .unwrap();
        views.attach(bundle);

        assert_eq!(views.render(), 1);
        let center = renderer.borrow().char_at(20, 10).unwrap();
        assert_ne!(center, ' ');
    }
}
