//! The drawing API callers actually program against.
//!
//! `DrawContext` buffers every mutating call as an encoded [`Command`] (grounded on
//! `core_render::writer::Writer`'s buffer-then-flush shape) and only touches the
//! transport on [`flush`](DrawContext::flush) or a query method. This keeps the
//! common case — draw a bunch of primitives, flush once — to a single outbound
//! message regardless of how many calls built it up.

use crate::handle::{GradientHandle, ImageDataHandle, ImageHandle, PatternHandle, ReleaseSink};
use crate::query::{ImageDataResult, ImageLoadOutcome, PendingImageLoads, PendingQueries, TextMetrics};
use crate::quit::QuitSignal;
use crate::registry::{IdSpaceExhausted, ResourceRegistry};
use crate::writer::FrameWriter;
use canvas_wire::{
    Color, Command, CompositeOperation, CursorStyle, Direction, FillRule, ImageSmoothingQuality,
    LineCap, LineJoin, PatternRepetition, ResourceId, TextAlign, TextBaseline,
};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex as AsyncMutex;

/// Shared construction pieces a [`DrawContext`] needs from whoever owns the session.
/// Bundled into one type so `Session::draw_context` doesn't need a six-argument
/// constructor.
pub struct ContextHandles<W: FrameWriter> {
    pub writer: Arc<W>,
    pub pending_queries: Arc<PendingQueries>,
    pub pending_image_loads: Arc<PendingImageLoads>,
    pub image_dims: Arc<Mutex<std::collections::HashMap<ResourceId, Arc<Mutex<(u32, u32)>>>>>,
    /// Fired the moment resource id allocation is exhausted, escalating what would
    /// otherwise be just a returned error into a session-ending fatal shutdown.
    pub quit: QuitSignal,
}

pub struct DrawContext<W: FrameWriter> {
    buffer: Vec<u8>,
    registry: ResourceRegistry,
    release_tx: tokio::sync::mpsc::UnboundedSender<Command>,
    release_rx: UnboundedReceiver<Command>,
    handles: ContextHandles<W>,
    /// Enforces "at most one query in flight" by holding this for the query's
    /// duration; a second concurrent caller queues on the lock instead of erroring.
    query_lock: Arc<AsyncMutex<()>>,
}

impl<W: FrameWriter> DrawContext<W> {
    pub fn new(handles: ContextHandles<W>) -> Self {
        let (release_tx, release_rx) = tokio::sync::mpsc::unbounded_channel();
        Self {
            buffer: Vec::new(),
            registry: ResourceRegistry::new(),
            release_tx,
            release_rx,
            handles,
            query_lock: Arc::new(AsyncMutex::new(())),
        }
    }

    fn release_sink(&self) -> ReleaseSink {
        ReleaseSink::new(self.release_tx.clone())
    }

    fn push(&mut self, cmd: Command) {
        cmd.encode(&mut self.buffer);
    }

    /// Allocate the next id for `kind`. Counter overflow is a fatal session
    /// condition (a wrapped id could alias a still-live resource): on exhaustion
    /// this fires the session's quit signal in addition to returning the error, so
    /// the session tears down even if the caller doesn't propagate the `Result`.
    fn alloc(&mut self, kind: canvas_wire::ResourceKind) -> Result<ResourceId, IdSpaceExhausted> {
        let result = self.registry.alloc(kind);
        if result.is_err() {
            self.handles.quit.signal();
        }
        result
    }

    /// Drain any pending resource releases (from handles dropped since the last
    /// flush) onto the end of the buffer, then send the whole thing as one frame.
    /// Releases must land after everything already buffered: a handle can only be
    /// dropped after its last use, so the use always precedes the release on the wire.
    pub async fn flush(&mut self) -> anyhow::Result<()> {
        while let Ok(cmd) = self.release_rx.try_recv() {
            if let Command::ReleaseResource {
                kind: canvas_wire::ResourceKind::Image,
                id,
            } = cmd
            {
                self.handles.image_dims.lock().unwrap().remove(&id);
            }
            cmd.encode(&mut self.buffer);
        }
        if self.buffer.is_empty() {
            return Ok(());
        }
        let bytes = std::mem::take(&mut self.buffer);
        self.handles.writer.send_frame(bytes).await
    }

    // ---- state stack ----

    pub fn save(&mut self) {
        self.push(Command::Save);
    }

    pub fn restore(&mut self) {
        self.push(Command::Restore);
    }

    // ---- style ----

    pub fn set_fill_style_color(&mut self, color: Color) {
        self.push(Command::SetFillStyleColor(color));
    }

    pub fn set_fill_style_gradient(&mut self, gradient: &GradientHandle) {
        self.push(Command::SetFillStyleGradient(gradient.id()));
    }

    pub fn set_fill_style_pattern(&mut self, pattern: &PatternHandle) {
        self.push(Command::SetFillStylePattern(pattern.id()));
    }

    pub fn set_stroke_style_color(&mut self, color: Color) {
        self.push(Command::SetStrokeStyleColor(color));
    }

    pub fn set_stroke_style_gradient(&mut self, gradient: &GradientHandle) {
        self.push(Command::SetStrokeStyleGradient(gradient.id()));
    }

    pub fn set_stroke_style_pattern(&mut self, pattern: &PatternHandle) {
        self.push(Command::SetStrokeStylePattern(pattern.id()));
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.push(Command::SetLineWidth(width));
    }

    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.push(Command::SetLineCap(cap));
    }

    pub fn set_line_join(&mut self, join: LineJoin) {
        self.push(Command::SetLineJoin(join));
    }

    pub fn set_miter_limit(&mut self, limit: f64) {
        self.push(Command::SetMiterLimit(limit));
    }

    pub fn set_line_dash(&mut self, dashes: Vec<f64>) {
        self.push(Command::SetLineDash(dashes));
    }

    pub fn set_line_dash_offset(&mut self, offset: f64) {
        self.push(Command::SetLineDashOffset(offset));
    }

    pub fn set_global_alpha(&mut self, alpha: f64) {
        self.push(Command::SetGlobalAlpha(alpha));
    }

    pub fn set_global_composite_operation(&mut self, op: CompositeOperation) {
        self.push(Command::SetGlobalCompositeOperation(op));
    }

    pub fn set_shadow_color(&mut self, color: Color) {
        self.push(Command::SetShadowColor(color));
    }

    pub fn set_shadow_blur(&mut self, blur: f64) {
        self.push(Command::SetShadowBlur(blur));
    }

    pub fn set_shadow_offset_x(&mut self, offset: f64) {
        self.push(Command::SetShadowOffsetX(offset));
    }

    pub fn set_shadow_offset_y(&mut self, offset: f64) {
        self.push(Command::SetShadowOffsetY(offset));
    }

    pub fn set_image_smoothing_enabled(&mut self, enabled: bool) {
        self.push(Command::SetImageSmoothingEnabled(enabled));
    }

    pub fn set_image_smoothing_quality(&mut self, quality: ImageSmoothingQuality) {
        self.push(Command::SetImageSmoothingQuality(quality));
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.push(Command::SetFilter(filter.into()));
    }

    // ---- transform ----

    pub fn translate(&mut self, x: f64, y: f64) {
        self.push(Command::Translate(x, y));
    }

    pub fn scale(&mut self, x: f64, y: f64) {
        self.push(Command::Scale(x, y));
    }

    pub fn rotate(&mut self, radians: f64) {
        self.push(Command::Rotate(radians));
    }

    pub fn transform(&mut self, matrix: [f64; 6]) {
        self.push(Command::Transform(matrix));
    }

    pub fn set_transform(&mut self, matrix: [f64; 6]) {
        self.push(Command::SetTransform(matrix));
    }

    pub fn reset_transform(&mut self) {
        self.push(Command::ResetTransform);
    }

    // ---- rects ----

    pub fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(Command::ClearRect(x, y, w, h));
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(Command::FillRect(x, y, w, h));
    }

    pub fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(Command::StrokeRect(x, y, w, h));
    }

    // ---- path construction ----

    pub fn begin_path(&mut self) {
        self.push(Command::BeginPath);
    }

    pub fn close_path(&mut self) {
        self.push(Command::ClosePath);
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.push(Command::MoveTo(x, y));
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.push(Command::LineTo(x, y));
    }

    pub fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.push(Command::QuadraticCurveTo(cpx, cpy, x, y));
    }

    pub fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.push(Command::BezierCurveTo(cp1x, cp1y, cp2x, cp2y, x, y));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn arc(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) {
        self.push(Command::Arc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            anticlockwise,
        });
    }

    pub fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64) {
        self.push(Command::ArcTo {
            x1,
            y1,
            x2,
            y2,
            radius,
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn ellipse(
        &mut self,
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) {
        self.push(Command::Ellipse {
            x,
            y,
            radius_x,
            radius_y,
            rotation,
            start_angle,
            end_angle,
            anticlockwise,
        });
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(Command::Rect(x, y, w, h));
    }

    // ---- path ops ----

    pub fn fill(&mut self, rule: FillRule) {
        self.push(Command::Fill(rule));
    }

    pub fn stroke(&mut self) {
        self.push(Command::Stroke);
    }

    pub fn clip(&mut self, rule: FillRule) {
        self.push(Command::Clip(rule));
    }

    /// Flushes, asks the browser whether `(x, y)` is inside the current path, and
    /// awaits the reply. Serialized against any other query in flight.
    pub async fn is_point_in_path(&mut self, x: f64, y: f64, rule: FillRule) -> anyhow::Result<bool> {
        let _permit = self.query_lock.clone().lock_owned().await;
        let (query_id, rx) = self.handles.pending_queries.register();
        tracing::debug!(target: "context.query", query_id, "is_point_in_path");
        self.push(Command::IsPointInPath {
            query_id,
            x,
            y,
            rule,
        });
        self.flush().await?;
        match rx.await? {
            canvas_wire::ClientEvent::PointInPath { result, .. } => Ok(result),
            other => anyhow::bail!("unexpected reply to IsPointInPath: {other:?}"),
        }
    }

    pub async fn is_point_in_stroke(&mut self, x: f64, y: f64) -> anyhow::Result<bool> {
        let _permit = self.query_lock.clone().lock_owned().await;
        let (query_id, rx) = self.handles.pending_queries.register();
        self.push(Command::IsPointInStroke { query_id, x, y });
        self.flush().await?;
        match rx.await? {
            canvas_wire::ClientEvent::PointInStroke { result, .. } => Ok(result),
            other => anyhow::bail!("unexpected reply to IsPointInStroke: {other:?}"),
        }
    }

    // ---- text ----

    pub fn set_font(&mut self, font: impl Into<String>) {
        self.push(Command::SetFont(font.into()));
    }

    pub fn set_text_align(&mut self, align: TextAlign) {
        self.push(Command::SetTextAlign(align));
    }

    pub fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.push(Command::SetTextBaseline(baseline));
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.push(Command::SetDirection(direction));
    }

    pub fn fill_text(&mut self, text: impl Into<String>, x: f64, y: f64, max_width: Option<f64>) {
        self.push(Command::FillText {
            text: text.into(),
            x,
            y,
            max_width,
        });
    }

    pub fn stroke_text(&mut self, text: impl Into<String>, x: f64, y: f64, max_width: Option<f64>) {
        self.push(Command::StrokeText {
            text: text.into(),
            x,
            y,
            max_width,
        });
    }

    pub async fn measure_text(&mut self, text: impl Into<String>) -> anyhow::Result<TextMetrics> {
        let _permit = self.query_lock.clone().lock_owned().await;
        let (query_id, rx) = self.handles.pending_queries.register();
        tracing::debug!(target: "context.query", query_id, "measure_text");
        self.push(Command::MeasureText {
            query_id,
            text: text.into(),
        });
        self.flush().await?;
        match rx.await? {
            canvas_wire::ClientEvent::TextMetrics {
                width,
                actual_bounding_box_ascent,
                actual_bounding_box_descent,
                ..
            } => Ok(TextMetrics {
                width,
                actual_bounding_box_ascent,
                actual_bounding_box_descent,
            }),
            other => anyhow::bail!("unexpected reply to MeasureText: {other:?}"),
        }
    }

    // ---- images ----

    /// Starts loading `url` in the browser. Returns immediately with a handle whose
    /// dimensions read as zero until the load completes; call
    /// [`wait_loaded`](Self::wait_loaded) to await the outcome explicitly.
    pub fn load_image(&mut self, url: impl Into<String>) -> Result<ImageHandle, IdSpaceExhausted> {
        let id = self.alloc(canvas_wire::ResourceKind::Image)?;
        let dims = Arc::new(Mutex::new((0, 0)));
        self.handles
            .image_dims
            .lock()
            .unwrap()
            .insert(id, dims.clone());
        self.push(Command::CreateImage {
            id,
            url: url.into(),
        });
        Ok(ImageHandle::new(id, self.release_sink(), dims))
    }

    /// Awaits the `ImageLoaded` reply for `handle`. Multiple callers may await the
    /// same handle's load; each gets its own registration.
    pub async fn wait_loaded(&self, handle: &ImageHandle) -> anyhow::Result<ImageLoadOutcome> {
        let rx = self.handles.pending_image_loads.register(handle.id());
        Ok(rx.await?)
    }

    pub fn draw_image(&mut self, image: &ImageHandle, dx: f64, dy: f64) {
        self.push(Command::DrawImage3 {
            id: image.id(),
            dx,
            dy,
        });
    }

    pub fn draw_image_scaled(&mut self, image: &ImageHandle, dx: f64, dy: f64, dw: f64, dh: f64) {
        self.push(Command::DrawImage5 {
            id: image.id(),
            dx,
            dy,
            dw,
            dh,
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_image_subrect(
        &mut self,
        image: &ImageHandle,
        sx: f64,
        sy: f64,
        sw: f64,
        sh: f64,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
    ) {
        self.push(Command::DrawImage9 {
            id: image.id(),
            sx,
            sy,
            sw,
            sh,
            dx,
            dy,
            dw,
            dh,
        });
    }

    pub fn create_image_data(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<ImageDataHandle, IdSpaceExhausted> {
        let id = self.alloc(canvas_wire::ResourceKind::ImageData)?;
        self.push(Command::CreateImageData { id, width, height });
        Ok(ImageDataHandle::new(id, self.release_sink()))
    }

    pub async fn get_image_data(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> anyhow::Result<ImageDataResult> {
        let _permit = self.query_lock.clone().lock_owned().await;
        let (query_id, rx) = self.handles.pending_queries.register();
        tracing::debug!(target: "context.query", query_id, "get_image_data");
        self.push(Command::GetImageData {
            query_id,
            x,
            y,
            width,
            height,
        });
        self.flush().await?;
        match rx.await? {
            canvas_wire::ClientEvent::ImageData {
                width,
                height,
                data,
                ..
            } => Ok(ImageDataResult {
                width,
                height,
                data,
            }),
            other => anyhow::bail!("unexpected reply to GetImageData: {other:?}"),
        }
    }

    pub fn put_image_data(&mut self, data: &ImageDataHandle, x: f64, y: f64) {
        self.push(Command::PutImageData {
            id: data.id(),
            x,
            y,
        });
    }

    // ---- gradients / patterns ----

    pub fn create_linear_gradient(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
    ) -> Result<GradientHandle, IdSpaceExhausted> {
        let id = self.alloc(canvas_wire::ResourceKind::Gradient)?;
        self.push(Command::CreateLinearGradient { id, x0, y0, x1, y1 });
        Ok(GradientHandle::new(id, self.release_sink()))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_radial_gradient(
        &mut self,
        x0: f64,
        y0: f64,
        r0: f64,
        x1: f64,
        y1: f64,
        r1: f64,
    ) -> Result<GradientHandle, IdSpaceExhausted> {
        let id = self.alloc(canvas_wire::ResourceKind::Gradient)?;
        self.push(Command::CreateRadialGradient {
            id,
            x0,
            y0,
            r0,
            x1,
            y1,
        });
        Ok(GradientHandle::new(id, self.release_sink()))
    }

    pub fn add_color_stop(&mut self, gradient: &GradientHandle, offset: f64, color: Color) {
        self.push(Command::AddColorStop {
            id: gradient.id(),
            offset,
            color,
        });
    }

    pub fn create_pattern(
        &mut self,
        image: &ImageHandle,
        repetition: PatternRepetition,
    ) -> Result<PatternHandle, IdSpaceExhausted> {
        let id = self.alloc(canvas_wire::ResourceKind::Pattern)?;
        self.push(Command::CreatePattern {
            id,
            image_id: image.id(),
            repetition,
        });
        Ok(PatternHandle::new(id, self.release_sink()))
    }

    // ---- focus / cursor ----

    pub fn set_cursor(&mut self, cursor: CursorStyle) {
        self.push(Command::SetCursor(cursor));
    }

    pub fn request_pointer_capture(&mut self) {
        self.push(Command::RequestPointerCapture);
    }

    pub fn release_pointer_capture(&mut self) {
        self.push(Command::ReleasePointerCapture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct RecordingWriter {
        frames: Mutex<Vec<Vec<u8>>>,
    }

    impl FrameWriter for RecordingWriter {
        async fn send_frame(&self, bytes: Vec<u8>) -> anyhow::Result<()> {
            self.frames.lock().unwrap().push(bytes);
            Ok(())
        }
    }

    fn test_context() -> (DrawContext<RecordingWriter>, Arc<RecordingWriter>) {
        let writer = Arc::new(RecordingWriter {
            frames: Mutex::new(Vec::new()),
        });
        let handles = ContextHandles {
            writer: writer.clone(),
            pending_queries: Arc::new(PendingQueries::new()),
            pending_image_loads: Arc::new(PendingImageLoads::new()),
            image_dims: Arc::new(Mutex::new(std::collections::HashMap::new())),
            quit: QuitSignal::new(),
        };
        (DrawContext::new(handles), writer)
    }

    #[tokio::test]
    async fn buffered_commands_flush_as_one_frame() {
        let (mut ctx, writer) = test_context();
        ctx.set_fill_style_color(Color::rgb(200, 0, 0));
        ctx.fill_rect(10.0, 10.0, 50.0, 50.0);
        ctx.flush().await.unwrap();

        let frames = writer.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        let mut cursor = frames[0].as_slice();
        assert_eq!(
            Command::decode(&mut cursor).unwrap(),
            Command::SetFillStyleColor(Color::rgb(200, 0, 0))
        );
        assert_eq!(
            Command::decode(&mut cursor).unwrap(),
            Command::FillRect(10.0, 10.0, 50.0, 50.0)
        );
        assert!(cursor.is_empty());
    }

    #[tokio::test]
    async fn empty_buffer_does_not_send_a_frame() {
        let (mut ctx, writer) = test_context();
        ctx.flush().await.unwrap();
        assert!(writer.frames.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn id_space_exhaustion_fires_the_quit_signal() {
        let (mut ctx, _writer) = test_context();
        ctx.registry = ResourceRegistry::exhausted(canvas_wire::ResourceKind::Gradient);
        let quit = ctx.handles.quit.clone();
        assert!(!quit.is_signaled());

        let err = ctx
            .create_linear_gradient(0.0, 0.0, 1.0, 1.0)
            .expect_err("exhausted counter must not hand out an id");
        assert_eq!(err.kind, canvas_wire::ResourceKind::Gradient);
        assert!(quit.is_signaled(), "exhaustion must escalate to fatal shutdown");
    }

    #[tokio::test]
    async fn dropped_handle_release_is_flushed_after_its_use() {
        // Mirrors the create/use/fill/drop/flush-once shape of demo scenario S6: the
        // release must land after every command that referenced the handle's id.
        let (mut ctx, writer) = test_context();
        let gradient = ctx.create_linear_gradient(0.0, 0.0, 10.0, 10.0).unwrap();
        ctx.set_fill_style_gradient(&gradient);
        ctx.fill_rect(0.0, 0.0, 1.0, 1.0);
        drop(gradient);
        ctx.flush().await.unwrap();

        let frames = writer.frames.lock().unwrap();
        let mut cursor = frames[0].as_slice();
        assert!(matches!(
            Command::decode(&mut cursor).unwrap(),
            Command::CreateLinearGradient { .. }
        ));
        assert!(matches!(
            Command::decode(&mut cursor).unwrap(),
            Command::SetFillStyleGradient(_)
        ));
        assert_eq!(
            Command::decode(&mut cursor).unwrap(),
            Command::FillRect(0.0, 0.0, 1.0, 1.0)
        );
        assert!(matches!(
            Command::decode(&mut cursor).unwrap(),
            Command::ReleaseResource { .. }
        ));
        assert!(cursor.is_empty());
    }

    #[tokio::test]
    async fn dropped_image_handle_removes_its_dims_entry() {
        let (mut ctx, _writer) = test_context();
        let image_dims = ctx.handles.image_dims.clone();
        let image = ctx.load_image("https://example.com/sprite.png").unwrap();
        let id = image.id();
        assert!(image_dims.lock().unwrap().contains_key(&id));

        drop(image);
        ctx.flush().await.unwrap();
        assert!(!image_dims.lock().unwrap().contains_key(&id));
    }

    #[tokio::test]
    async fn is_point_in_path_awaits_its_reply() {
        let (mut ctx, _writer) = test_context();
        let pending = ctx.handles.pending_queries.clone();
        let done = Arc::new(AtomicBool::new(false));
        let done2 = done.clone();

        let query = async {
            let result = ctx
                .is_point_in_path(1.0, 2.0, FillRule::NonZero)
                .await
                .unwrap();
            done2.store(true, Ordering::SeqCst);
            result
        };
        let reply = async {
            // Give the query a chance to register before fulfilling it.
            tokio::task::yield_now().await;
            pending.fulfill(
                0,
                canvas_wire::ClientEvent::PointInPath {
                    query_id: 0,
                    result: true,
                },
            );
        };
        let (result, _) = tokio::join!(query, reply);
        assert!(result);
        assert!(done.load(Ordering::SeqCst));
    }
}
