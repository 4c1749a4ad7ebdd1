//! Server-to-client command frames: `opcode:u8` followed by the opcode's argument list.
//!
//! Opcodes are packed densely starting at 0 so a browser-side dispatch table can be a
//! flat array. The numbering here is the external interface the browser shim is
//! compiled against — never renumber an existing variant, only append new ones.

use crate::enums::{
    CompositeOperation, CursorStyle, Direction, FillRule, ImageSmoothingQuality, LineCap,
    LineJoin, PatternRepetition, TextAlign, TextBaseline,
};
use crate::primitives::*;
use crate::resource::{ResourceId, ResourceKind};
use crate::{Color, DecodeError};

/// First byte of the first outbound frame on every session; the browser shim closes
/// the transport if this does not match its own compiled-in constant.
pub const PROTOCOL_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Configure = 0,
    Save = 1,
    Restore = 2,
    SetFillStyleColor = 3,
    SetFillStyleGradient = 4,
    SetFillStylePattern = 5,
    SetStrokeStyleColor = 6,
    SetStrokeStyleGradient = 7,
    SetStrokeStylePattern = 8,
    SetLineWidth = 9,
    SetLineCap = 10,
    SetLineJoin = 11,
    SetMiterLimit = 12,
    SetLineDash = 13,
    SetLineDashOffset = 14,
    SetGlobalAlpha = 15,
    SetGlobalCompositeOperation = 16,
    SetShadowColor = 17,
    SetShadowBlur = 18,
    SetShadowOffsetX = 19,
    SetShadowOffsetY = 20,
    SetImageSmoothingEnabled = 21,
    SetImageSmoothingQuality = 22,
    SetFilter = 23,
    Translate = 24,
    Scale = 25,
    Rotate = 26,
    Transform = 27,
    SetTransform = 28,
    ResetTransform = 29,
    ClearRect = 30,
    FillRect = 31,
    StrokeRect = 32,
    BeginPath = 33,
    ClosePath = 34,
    MoveTo = 35,
    LineTo = 36,
    QuadraticCurveTo = 37,
    BezierCurveTo = 38,
    Arc = 39,
    ArcTo = 40,
    Ellipse = 41,
    Rect = 42,
    Fill = 43,
    Stroke = 44,
    Clip = 45,
    IsPointInPath = 46,
    IsPointInStroke = 47,
    SetFont = 48,
    SetTextAlign = 49,
    SetTextBaseline = 50,
    SetDirection = 51,
    FillText = 52,
    StrokeText = 53,
    MeasureText = 54,
    CreateImage = 55,
    DrawImage3 = 56,
    DrawImage5 = 57,
    DrawImage9 = 58,
    CreateImageData = 59,
    GetImageData = 60,
    PutImageData = 61,
    CreateLinearGradient = 62,
    CreateRadialGradient = 63,
    AddColorStop = 64,
    CreatePattern = 65,
    ReleaseResource = 66,
    SetCursor = 67,
    RequestPointerCapture = 68,
    ReleasePointerCapture = 69,
}

impl Opcode {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;
    fn try_from(value: u8) -> Result<Self, DecodeError> {
        use Opcode::*;
        const TABLE: &[Opcode] = &[
            Configure,
            Save,
            Restore,
            SetFillStyleColor,
            SetFillStyleGradient,
            SetFillStylePattern,
            SetStrokeStyleColor,
            SetStrokeStyleGradient,
            SetStrokeStylePattern,
            SetLineWidth,
            SetLineCap,
            SetLineJoin,
            SetMiterLimit,
            SetLineDash,
            SetLineDashOffset,
            SetGlobalAlpha,
            SetGlobalCompositeOperation,
            SetShadowColor,
            SetShadowBlur,
            SetShadowOffsetX,
            SetShadowOffsetY,
            SetImageSmoothingEnabled,
            SetImageSmoothingQuality,
            SetFilter,
            Translate,
            Scale,
            Rotate,
            Transform,
            SetTransform,
            ResetTransform,
            ClearRect,
            FillRect,
            StrokeRect,
            BeginPath,
            ClosePath,
            MoveTo,
            LineTo,
            QuadraticCurveTo,
            BezierCurveTo,
            Arc,
            ArcTo,
            Ellipse,
            Rect,
            Fill,
            Stroke,
            Clip,
            IsPointInPath,
            IsPointInStroke,
            SetFont,
            SetTextAlign,
            SetTextBaseline,
            SetDirection,
            FillText,
            StrokeText,
            MeasureText,
            CreateImage,
            DrawImage3,
            DrawImage5,
            DrawImage9,
            CreateImageData,
            GetImageData,
            PutImageData,
            CreateLinearGradient,
            CreateRadialGradient,
            AddColorStop,
            CreatePattern,
            ReleaseResource,
            SetCursor,
            RequestPointerCapture,
            ReleasePointerCapture,
        ];
        TABLE
            .get(value as usize)
            .copied()
            .ok_or(DecodeError::UnknownOpcode(value))
    }
}

bitflags::bitflags! {
    /// Event-enable mask sent in the `Configure` frame. The browser shim attaches a
    /// listener only for kinds present in the mask; mouse motion is opt-in because its
    /// frequency would otherwise flood the event channel.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EventMask: u32 {
        const MOUSE_MOVE    = 1 << 0;
        const MOUSE_DOWN    = 1 << 1;
        const MOUSE_UP      = 1 << 2;
        const MOUSE_ENTER   = 1 << 3;
        const MOUSE_LEAVE   = 1 << 4;
        const MOUSE_OVER    = 1 << 5;
        const MOUSE_OUT     = 1 << 6;
        const WHEEL         = 1 << 7;
        const KEY_DOWN      = 1 << 8;
        const KEY_UP        = 1 << 9;
        const KEY_PRESS     = 1 << 10;
        const TOUCH         = 1 << 11;
        const RESIZE        = 1 << 12;
        const CLICK         = 1 << 13;
        const DBLCLICK      = 1 << 14;
        const AUXCLICK      = 1 << 15;
        const CONTEXT_MENU  = 1 << 16;
        const FOCUS_BLUR    = 1 << 17;
    }
}

/// Server-to-client drawing command. One variant per opcode; argument order matches
/// the field declaration order, which matches the wire order.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Configure {
        width: u32,
        height: u32,
        title: String,
        background: Color,
        event_mask: EventMask,
        cursor: CursorStyle,
    },
    Save,
    Restore,
    SetFillStyleColor(Color),
    SetFillStyleGradient(ResourceId),
    SetFillStylePattern(ResourceId),
    SetStrokeStyleColor(Color),
    SetStrokeStyleGradient(ResourceId),
    SetStrokeStylePattern(ResourceId),
    SetLineWidth(f64),
    SetLineCap(LineCap),
    SetLineJoin(LineJoin),
    SetMiterLimit(f64),
    SetLineDash(Vec<f64>),
    SetLineDashOffset(f64),
    SetGlobalAlpha(f64),
    SetGlobalCompositeOperation(CompositeOperation),
    SetShadowColor(Color),
    SetShadowBlur(f64),
    SetShadowOffsetX(f64),
    SetShadowOffsetY(f64),
    SetImageSmoothingEnabled(bool),
    SetImageSmoothingQuality(ImageSmoothingQuality),
    SetFilter(String),
    Translate(f64, f64),
    Scale(f64, f64),
    Rotate(f64),
    Transform([f64; 6]),
    SetTransform([f64; 6]),
    ResetTransform,
    ClearRect(f64, f64, f64, f64),
    FillRect(f64, f64, f64, f64),
    StrokeRect(f64, f64, f64, f64),
    BeginPath,
    ClosePath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    QuadraticCurveTo(f64, f64, f64, f64),
    BezierCurveTo(f64, f64, f64, f64, f64, f64),
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    },
    ArcTo {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        radius: f64,
    },
    Ellipse {
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    },
    Rect(f64, f64, f64, f64),
    Fill(FillRule),
    Stroke,
    Clip(FillRule),
    IsPointInPath {
        query_id: u32,
        x: f64,
        y: f64,
        rule: FillRule,
    },
    IsPointInStroke {
        query_id: u32,
        x: f64,
        y: f64,
    },
    SetFont(String),
    SetTextAlign(TextAlign),
    SetTextBaseline(TextBaseline),
    SetDirection(Direction),
    FillText {
        text: String,
        x: f64,
        y: f64,
        max_width: Option<f64>,
    },
    StrokeText {
        text: String,
        x: f64,
        y: f64,
        max_width: Option<f64>,
    },
    MeasureText {
        query_id: u32,
        text: String,
    },
    CreateImage {
        id: ResourceId,
        url: String,
    },
    DrawImage3 {
        id: ResourceId,
        dx: f64,
        dy: f64,
    },
    DrawImage5 {
        id: ResourceId,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
    },
    DrawImage9 {
        id: ResourceId,
        sx: f64,
        sy: f64,
        sw: f64,
        sh: f64,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
    },
    CreateImageData {
        id: ResourceId,
        width: u32,
        height: u32,
    },
    GetImageData {
        query_id: u32,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    PutImageData {
        id: ResourceId,
        x: f64,
        y: f64,
    },
    CreateLinearGradient {
        id: ResourceId,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
    },
    CreateRadialGradient {
        id: ResourceId,
        x0: f64,
        y0: f64,
        r0: f64,
        x1: f64,
        y1: f64,
        r1: f64,
    },
    AddColorStop {
        id: ResourceId,
        offset: f64,
        color: Color,
    },
    CreatePattern {
        id: ResourceId,
        image_id: ResourceId,
        repetition: PatternRepetition,
    },
    ReleaseResource {
        kind: ResourceKind,
        id: ResourceId,
    },
    SetCursor(CursorStyle),
    RequestPointerCapture,
    ReleasePointerCapture,
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        use Command::*;
        match self {
            Configure { .. } => Opcode::Configure,
            Save => Opcode::Save,
            Restore => Opcode::Restore,
            SetFillStyleColor(_) => Opcode::SetFillStyleColor,
            SetFillStyleGradient(_) => Opcode::SetFillStyleGradient,
            SetFillStylePattern(_) => Opcode::SetFillStylePattern,
            SetStrokeStyleColor(_) => Opcode::SetStrokeStyleColor,
            SetStrokeStyleGradient(_) => Opcode::SetStrokeStyleGradient,
            SetStrokeStylePattern(_) => Opcode::SetStrokeStylePattern,
            SetLineWidth(_) => Opcode::SetLineWidth,
            SetLineCap(_) => Opcode::SetLineCap,
            SetLineJoin(_) => Opcode::SetLineJoin,
            SetMiterLimit(_) => Opcode::SetMiterLimit,
            SetLineDash(_) => Opcode::SetLineDash,
            SetLineDashOffset(_) => Opcode::SetLineDashOffset,
            SetGlobalAlpha(_) => Opcode::SetGlobalAlpha,
            SetGlobalCompositeOperation(_) => Opcode::SetGlobalCompositeOperation,
            SetShadowColor(_) => Opcode::SetShadowColor,
            SetShadowBlur(_) => Opcode::SetShadowBlur,
            SetShadowOffsetX(_) => Opcode::SetShadowOffsetX,
            SetShadowOffsetY(_) => Opcode::SetShadowOffsetY,
            SetImageSmoothingEnabled(_) => Opcode::SetImageSmoothingEnabled,
            SetImageSmoothingQuality(_) => Opcode::SetImageSmoothingQuality,
            SetFilter(_) => Opcode::SetFilter,
            Translate(..) => Opcode::Translate,
            Scale(..) => Opcode::Scale,
            Rotate(_) => Opcode::Rotate,
            Transform(_) => Opcode::Transform,
            SetTransform(_) => Opcode::SetTransform,
            ResetTransform => Opcode::ResetTransform,
            ClearRect(..) => Opcode::ClearRect,
            FillRect(..) => Opcode::FillRect,
            StrokeRect(..) => Opcode::StrokeRect,
            BeginPath => Opcode::BeginPath,
            ClosePath => Opcode::ClosePath,
            MoveTo(..) => Opcode::MoveTo,
            LineTo(..) => Opcode::LineTo,
            QuadraticCurveTo(..) => Opcode::QuadraticCurveTo,
            BezierCurveTo(..) => Opcode::BezierCurveTo,
            Arc { .. } => Opcode::Arc,
            ArcTo { .. } => Opcode::ArcTo,
            Ellipse { .. } => Opcode::Ellipse,
            Rect(..) => Opcode::Rect,
            Fill(_) => Opcode::Fill,
            Stroke => Opcode::Stroke,
            Clip(_) => Opcode::Clip,
            IsPointInPath { .. } => Opcode::IsPointInPath,
            IsPointInStroke { .. } => Opcode::IsPointInStroke,
            SetFont(_) => Opcode::SetFont,
            SetTextAlign(_) => Opcode::SetTextAlign,
            SetTextBaseline(_) => Opcode::SetTextBaseline,
            SetDirection(_) => Opcode::SetDirection,
            FillText { .. } => Opcode::FillText,
            StrokeText { .. } => Opcode::StrokeText,
            MeasureText { .. } => Opcode::MeasureText,
            CreateImage { .. } => Opcode::CreateImage,
            DrawImage3 { .. } => Opcode::DrawImage3,
            DrawImage5 { .. } => Opcode::DrawImage5,
            DrawImage9 { .. } => Opcode::DrawImage9,
            CreateImageData { .. } => Opcode::CreateImageData,
            GetImageData { .. } => Opcode::GetImageData,
            PutImageData { .. } => Opcode::PutImageData,
            CreateLinearGradient { .. } => Opcode::CreateLinearGradient,
            CreateRadialGradient { .. } => Opcode::CreateRadialGradient,
            AddColorStop { .. } => Opcode::AddColorStop,
            CreatePattern { .. } => Opcode::CreatePattern,
            ReleaseResource { .. } => Opcode::ReleaseResource,
            SetCursor(_) => Opcode::SetCursor,
            RequestPointerCapture => Opcode::RequestPointerCapture,
            ReleasePointerCapture => Opcode::ReleasePointerCapture,
        }
    }

    /// Append this command's complete, validly encoded frame to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        put_u8(buf, self.opcode().as_u8());
        use Command::*;
        match self {
            Configure {
                width,
                height,
                title,
                background,
                event_mask,
                cursor,
            } => {
                put_u32(buf, *width);
                put_u32(buf, *height);
                put_string(buf, title);
                put_color(buf, *background);
                put_u32(buf, event_mask.bits());
                put_u8(buf, cursor.as_u8());
            }
            Save | Restore | ResetTransform | BeginPath | ClosePath | Stroke
            | RequestPointerCapture | ReleasePointerCapture => {}
            SetFillStyleColor(c) | SetStrokeStyleColor(c) | SetShadowColor(c) => {
                put_color(buf, *c)
            }
            SetFillStyleGradient(id) | SetFillStylePattern(id) | SetStrokeStyleGradient(id)
            | SetStrokeStylePattern(id) => put_u32(buf, id.get()),
            SetLineWidth(v) | SetMiterLimit(v) | SetLineDashOffset(v) | SetGlobalAlpha(v)
            | SetShadowBlur(v) | SetShadowOffsetX(v) | SetShadowOffsetY(v) | Rotate(v) => {
                put_f64(buf, *v)
            }
            SetLineCap(v) => put_u8(buf, v.as_u8()),
            SetLineJoin(v) => put_u8(buf, v.as_u8()),
            SetLineDash(dashes) => {
                put_u32(buf, dashes.len() as u32);
                for d in dashes {
                    put_f64(buf, *d);
                }
            }
            SetGlobalCompositeOperation(v) => put_u8(buf, v.as_u8()),
            SetImageSmoothingEnabled(v) => put_bool(buf, *v),
            SetImageSmoothingQuality(v) => put_u8(buf, v.as_u8()),
            SetFilter(s) | SetFont(s) => put_string(buf, s),
            Translate(x, y) | Scale(x, y) | MoveTo(x, y) | LineTo(x, y) => {
                put_f64(buf, *x);
                put_f64(buf, *y);
            }
            Transform(m) | SetTransform(m) => {
                for v in m {
                    put_f64(buf, *v);
                }
            }
            ClearRect(x, y, w, h) | FillRect(x, y, w, h) | StrokeRect(x, y, w, h)
            | Rect(x, y, w, h) => {
                put_f64(buf, *x);
                put_f64(buf, *y);
                put_f64(buf, *w);
                put_f64(buf, *h);
            }
            QuadraticCurveTo(cpx, cpy, x, y) => {
                put_f64(buf, *cpx);
                put_f64(buf, *cpy);
                put_f64(buf, *x);
                put_f64(buf, *y);
            }
            BezierCurveTo(cp1x, cp1y, cp2x, cp2y, x, y) => {
                for v in [cp1x, cp1y, cp2x, cp2y, x, y] {
                    put_f64(buf, *v);
                }
            }
            Arc {
                x,
                y,
                radius,
                start_angle,
                end_angle,
                anticlockwise,
            } => {
                for v in [x, y, radius, start_angle, end_angle] {
                    put_f64(buf, *v);
                }
                put_bool(buf, *anticlockwise);
            }
            ArcTo {
                x1,
                y1,
                x2,
                y2,
                radius,
            } => {
                for v in [x1, y1, x2, y2, radius] {
                    put_f64(buf, *v);
                }
            }
            Ellipse {
                x,
                y,
                radius_x,
                radius_y,
                rotation,
                start_angle,
                end_angle,
                anticlockwise,
            } => {
                for v in [x, y, radius_x, radius_y, rotation, start_angle, end_angle] {
                    put_f64(buf, *v);
                }
                put_bool(buf, *anticlockwise);
            }
            Fill(rule) | Clip(rule) => put_u8(buf, rule.as_u8()),
            IsPointInPath {
                query_id,
                x,
                y,
                rule,
            } => {
                put_u32(buf, *query_id);
                put_f64(buf, *x);
                put_f64(buf, *y);
                put_u8(buf, rule.as_u8());
            }
            IsPointInStroke { query_id, x, y } => {
                put_u32(buf, *query_id);
                put_f64(buf, *x);
                put_f64(buf, *y);
            }
            SetTextAlign(v) => put_u8(buf, v.as_u8()),
            SetTextBaseline(v) => put_u8(buf, v.as_u8()),
            SetDirection(v) => put_u8(buf, v.as_u8()),
            FillText {
                text,
                x,
                y,
                max_width,
            }
            | StrokeText {
                text,
                x,
                y,
                max_width,
            } => {
                put_string(buf, text);
                put_f64(buf, *x);
                put_f64(buf, *y);
                put_bool(buf, max_width.is_some());
                if let Some(w) = max_width {
                    put_f64(buf, *w);
                }
            }
            MeasureText { query_id, text } => {
                put_u32(buf, *query_id);
                put_string(buf, text);
            }
            CreateImage { id, url } => {
                put_u32(buf, id.get());
                put_string(buf, url);
            }
            DrawImage3 { id, dx, dy } => {
                put_u32(buf, id.get());
                put_f64(buf, *dx);
                put_f64(buf, *dy);
            }
            DrawImage5 { id, dx, dy, dw, dh } => {
                put_u32(buf, id.get());
                for v in [dx, dy, dw, dh] {
                    put_f64(buf, *v);
                }
            }
            DrawImage9 {
                id,
                sx,
                sy,
                sw,
                sh,
                dx,
                dy,
                dw,
                dh,
            } => {
                put_u32(buf, id.get());
                for v in [sx, sy, sw, sh, dx, dy, dw, dh] {
                    put_f64(buf, *v);
                }
            }
            CreateImageData { id, width, height } => {
                put_u32(buf, id.get());
                put_u32(buf, *width);
                put_u32(buf, *height);
            }
            GetImageData {
                query_id,
                x,
                y,
                width,
                height,
            } => {
                put_u32(buf, *query_id);
                for v in [x, y, width, height] {
                    put_f64(buf, *v);
                }
            }
            PutImageData { id, x, y } => {
                put_u32(buf, id.get());
                put_f64(buf, *x);
                put_f64(buf, *y);
            }
            CreateLinearGradient { id, x0, y0, x1, y1 } => {
                put_u32(buf, id.get());
                for v in [x0, y0, x1, y1] {
                    put_f64(buf, *v);
                }
            }
            CreateRadialGradient {
                id,
                x0,
                y0,
                r0,
                x1,
                y1,
                r1,
            } => {
                put_u32(buf, id.get());
                for v in [x0, y0, r0, x1, y1, r1] {
                    put_f64(buf, *v);
                }
            }
            AddColorStop { id, offset, color } => {
                put_u32(buf, id.get());
                put_f64(buf, *offset);
                put_color(buf, *color);
            }
            CreatePattern {
                id,
                image_id,
                repetition,
            } => {
                put_u32(buf, id.get());
                put_u32(buf, image_id.get());
                put_u8(buf, repetition.as_u8());
            }
            ReleaseResource { kind, id } => {
                put_u8(buf, kind.as_u8());
                put_u32(buf, id.get());
            }
            SetCursor(v) => put_u8(buf, v.as_u8()),
        }
    }

    /// Decode one complete command frame from the front of `input`, advancing the slice.
    /// Used by tests to verify round-trip encoding; production code never needs to
    /// decode the commands it emits.
    pub fn decode(input: &mut &[u8]) -> Result<Command, DecodeError> {
        let opcode = Opcode::try_from(get_u8(input)?)?;
        Ok(match opcode {
            Opcode::Configure => Command::Configure {
                width: get_u32(input)?,
                height: get_u32(input)?,
                title: get_string(input)?,
                background: get_color(input)?,
                event_mask: EventMask::from_bits_truncate(get_u32(input)?),
                cursor: CursorStyle::try_from(get_u8(input)?)?,
            },
            Opcode::Save => Command::Save,
            Opcode::Restore => Command::Restore,
            Opcode::SetFillStyleColor => Command::SetFillStyleColor(get_color(input)?),
            Opcode::SetFillStyleGradient => {
                Command::SetFillStyleGradient(ResourceId(get_u32(input)?))
            }
            Opcode::SetFillStylePattern => {
                Command::SetFillStylePattern(ResourceId(get_u32(input)?))
            }
            Opcode::SetStrokeStyleColor => Command::SetStrokeStyleColor(get_color(input)?),
            Opcode::SetStrokeStyleGradient => {
                Command::SetStrokeStyleGradient(ResourceId(get_u32(input)?))
            }
            Opcode::SetStrokeStylePattern => {
                Command::SetStrokeStylePattern(ResourceId(get_u32(input)?))
            }
            Opcode::SetLineWidth => Command::SetLineWidth(get_f64(input)?),
            Opcode::SetLineCap => Command::SetLineCap(LineCap::try_from(get_u8(input)?)?),
            Opcode::SetLineJoin => Command::SetLineJoin(LineJoin::try_from(get_u8(input)?)?),
            Opcode::SetMiterLimit => Command::SetMiterLimit(get_f64(input)?),
            Opcode::SetLineDash => {
                let n = get_u32(input)? as usize;
                let mut dashes = Vec::with_capacity(n);
                for _ in 0..n {
                    dashes.push(get_f64(input)?);
                }
                Command::SetLineDash(dashes)
            }
            Opcode::SetLineDashOffset => Command::SetLineDashOffset(get_f64(input)?),
            Opcode::SetGlobalAlpha => Command::SetGlobalAlpha(get_f64(input)?),
            Opcode::SetGlobalCompositeOperation => {
                Command::SetGlobalCompositeOperation(CompositeOperation::try_from(get_u8(input)?)?)
            }
            Opcode::SetShadowColor => Command::SetShadowColor(get_color(input)?),
            Opcode::SetShadowBlur => Command::SetShadowBlur(get_f64(input)?),
            Opcode::SetShadowOffsetX => Command::SetShadowOffsetX(get_f64(input)?),
            Opcode::SetShadowOffsetY => Command::SetShadowOffsetY(get_f64(input)?),
            Opcode::SetImageSmoothingEnabled => {
                Command::SetImageSmoothingEnabled(get_bool(input)?)
            }
            Opcode::SetImageSmoothingQuality => Command::SetImageSmoothingQuality(
                ImageSmoothingQuality::try_from(get_u8(input)?)?,
            ),
            Opcode::SetFilter => Command::SetFilter(get_string(input)?),
            Opcode::Translate => Command::Translate(get_f64(input)?, get_f64(input)?),
            Opcode::Scale => Command::Scale(get_f64(input)?, get_f64(input)?),
            Opcode::Rotate => Command::Rotate(get_f64(input)?),
            Opcode::Transform => Command::Transform(read_six(input)?),
            Opcode::SetTransform => Command::SetTransform(read_six(input)?),
            Opcode::ResetTransform => Command::ResetTransform,
            Opcode::ClearRect => Command::ClearRect(
                get_f64(input)?,
                get_f64(input)?,
                get_f64(input)?,
                get_f64(input)?,
            ),
            Opcode::FillRect => Command::FillRect(
                get_f64(input)?,
                get_f64(input)?,
                get_f64(input)?,
                get_f64(input)?,
            ),
            Opcode::StrokeRect => Command::StrokeRect(
                get_f64(input)?,
                get_f64(input)?,
                get_f64(input)?,
                get_f64(input)?,
            ),
            Opcode::BeginPath => Command::BeginPath,
            Opcode::ClosePath => Command::ClosePath,
            Opcode::MoveTo => Command::MoveTo(get_f64(input)?, get_f64(input)?),
            Opcode::LineTo => Command::LineTo(get_f64(input)?, get_f64(input)?),
            Opcode::QuadraticCurveTo => Command::QuadraticCurveTo(
                get_f64(input)?,
                get_f64(input)?,
                get_f64(input)?,
                get_f64(input)?,
            ),
            Opcode::BezierCurveTo => Command::BezierCurveTo(
                get_f64(input)?,
                get_f64(input)?,
                get_f64(input)?,
                get_f64(input)?,
                get_f64(input)?,
                get_f64(input)?,
            ),
            Opcode::Arc => Command::Arc {
                x: get_f64(input)?,
                y: get_f64(input)?,
                radius: get_f64(input)?,
                start_angle: get_f64(input)?,
                end_angle: get_f64(input)?,
                anticlockwise: get_bool(input)?,
            },
            Opcode::ArcTo => Command::ArcTo {
                x1: get_f64(input)?,
                y1: get_f64(input)?,
                x2: get_f64(input)?,
                y2: get_f64(input)?,
                radius: get_f64(input)?,
            },
            Opcode::Ellipse => Command::Ellipse {
                x: get_f64(input)?,
                y: get_f64(input)?,
                radius_x: get_f64(input)?,
                radius_y: get_f64(input)?,
                rotation: get_f64(input)?,
                start_angle: get_f64(input)?,
                end_angle: get_f64(input)?,
                anticlockwise: get_bool(input)?,
            },
            Opcode::Rect => Command::Rect(
                get_f64(input)?,
                get_f64(input)?,
                get_f64(input)?,
                get_f64(input)?,
            ),
            Opcode::Fill => Command::Fill(FillRule::try_from(get_u8(input)?)?),
            Opcode::Stroke => Command::Stroke,
            Opcode::Clip => Command::Clip(FillRule::try_from(get_u8(input)?)?),
            Opcode::IsPointInPath => Command::IsPointInPath {
                query_id: get_u32(input)?,
                x: get_f64(input)?,
                y: get_f64(input)?,
                rule: FillRule::try_from(get_u8(input)?)?,
            },
            Opcode::IsPointInStroke => Command::IsPointInStroke {
                query_id: get_u32(input)?,
                x: get_f64(input)?,
                y: get_f64(input)?,
            },
            Opcode::SetFont => Command::SetFont(get_string(input)?),
            Opcode::SetTextAlign => Command::SetTextAlign(TextAlign::try_from(get_u8(input)?)?),
            Opcode::SetTextBaseline => {
                Command::SetTextBaseline(TextBaseline::try_from(get_u8(input)?)?)
            }
            Opcode::SetDirection => Command::SetDirection(Direction::try_from(get_u8(input)?)?),
            Opcode::FillText => {
                let text = get_string(input)?;
                let x = get_f64(input)?;
                let y = get_f64(input)?;
                let has_max = get_bool(input)?;
                let max_width = if has_max { Some(get_f64(input)?) } else { None };
                Command::FillText {
                    text,
                    x,
                    y,
                    max_width,
                }
            }
            Opcode::StrokeText => {
                let text = get_string(input)?;
                let x = get_f64(input)?;
                let y = get_f64(input)?;
                let has_max = get_bool(input)?;
                let max_width = if has_max { Some(get_f64(input)?) } else { None };
                Command::StrokeText {
                    text,
                    x,
                    y,
                    max_width,
                }
            }
            Opcode::MeasureText => Command::MeasureText {
                query_id: get_u32(input)?,
                text: get_string(input)?,
            },
            Opcode::CreateImage => Command::CreateImage {
                id: ResourceId(get_u32(input)?),
                url: get_string(input)?,
            },
            Opcode::DrawImage3 => Command::DrawImage3 {
                id: ResourceId(get_u32(input)?),
                dx: get_f64(input)?,
                dy: get_f64(input)?,
            },
            Opcode::DrawImage5 => Command::DrawImage5 {
                id: ResourceId(get_u32(input)?),
                dx: get_f64(input)?,
                dy: get_f64(input)?,
                dw: get_f64(input)?,
                dh: get_f64(input)?,
            },
            Opcode::DrawImage9 => Command::DrawImage9 {
                id: ResourceId(get_u32(input)?),
                sx: get_f64(input)?,
                sy: get_f64(input)?,
                sw: get_f64(input)?,
                sh: get_f64(input)?,
                dx: get_f64(input)?,
                dy: get_f64(input)?,
                dw: get_f64(input)?,
                dh: get_f64(input)?,
            },
            Opcode::CreateImageData => Command::CreateImageData {
                id: ResourceId(get_u32(input)?),
                width: get_u32(input)?,
                height: get_u32(input)?,
            },
            Opcode::GetImageData => Command::GetImageData {
                query_id: get_u32(input)?,
                x: get_f64(input)?,
                y: get_f64(input)?,
                width: get_f64(input)?,
                height: get_f64(input)?,
            },
            Opcode::PutImageData => Command::PutImageData {
                id: ResourceId(get_u32(input)?),
                x: get_f64(input)?,
                y: get_f64(input)?,
            },
            Opcode::CreateLinearGradient => Command::CreateLinearGradient {
                id: ResourceId(get_u32(input)?),
                x0: get_f64(input)?,
                y0: get_f64(input)?,
                x1: get_f64(input)?,
                y1: get_f64(input)?,
            },
            Opcode::CreateRadialGradient => Command::CreateRadialGradient {
                id: ResourceId(get_u32(input)?),
                x0: get_f64(input)?,
                y0: get_f64(input)?,
                r0: get_f64(input)?,
                x1: get_f64(input)?,
                y1: get_f64(input)?,
                r1: get_f64(input)?,
            },
            Opcode::AddColorStop => Command::AddColorStop {
                id: ResourceId(get_u32(input)?),
                offset: get_f64(input)?,
                color: get_color(input)?,
            },
            Opcode::CreatePattern => Command::CreatePattern {
                id: ResourceId(get_u32(input)?),
                image_id: ResourceId(get_u32(input)?),
                repetition: PatternRepetition::try_from(get_u8(input)?)?,
            },
            Opcode::ReleaseResource => Command::ReleaseResource {
                kind: ResourceKind::try_from(get_u8(input)?)?,
                id: ResourceId(get_u32(input)?),
            },
            Opcode::SetCursor => Command::SetCursor(CursorStyle::try_from(get_u8(input)?)?),
            Opcode::RequestPointerCapture => Command::RequestPointerCapture,
            Opcode::ReleasePointerCapture => Command::ReleasePointerCapture,
        })
    }
}

fn read_six(input: &mut &[u8]) -> Result<[f64; 6], DecodeError> {
    let mut out = [0.0; 6];
    for slot in &mut out {
        *slot = get_f64(input)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(cmd: Command) {
        let mut buf = Vec::new();
        cmd.encode(&mut buf);
        let mut cursor = buf.as_slice();
        let decoded = Command::decode(&mut cursor).unwrap();
        assert_eq!(decoded, cmd);
        assert!(cursor.is_empty(), "decode left unread bytes for {cmd:?}");
    }

    #[test]
    fn round_trips_representative_commands() {
        round_trip(Command::Save);
        round_trip(Command::Restore);
        round_trip(Command::SetFillStyleColor(Color {
            r: 200,
            g: 0,
            b: 0,
            a: 255,
        }));
        round_trip(Command::SetFillStyleGradient(ResourceId(7)));
        round_trip(Command::SetLineWidth(2.5));
        round_trip(Command::SetLineDash(vec![4.0, 2.0, 1.0]));
        round_trip(Command::SetGlobalCompositeOperation(
            CompositeOperation::Multiply,
        ));
        round_trip(Command::Translate(10.0, -5.0));
        round_trip(Command::Transform([1.0, 0.0, 0.0, 1.0, 3.0, 4.0]));
        round_trip(Command::FillRect(10.0, 10.0, 50.0, 50.0));
        round_trip(Command::Arc {
            x: 1.0,
            y: 2.0,
            radius: 3.0,
            start_angle: 0.0,
            end_angle: std::f64::consts::PI,
            anticlockwise: true,
        });
        round_trip(Command::Fill(FillRule::EvenOdd));
        round_trip(Command::IsPointInPath {
            query_id: 9,
            x: 1.0,
            y: 2.0,
            rule: FillRule::NonZero,
        });
        round_trip(Command::FillText {
            text: "hello".into(),
            x: 0.0,
            y: 0.0,
            max_width: None,
        });
        round_trip(Command::FillText {
            text: "hello".into(),
            x: 0.0,
            y: 0.0,
            max_width: Some(42.0),
        });
        round_trip(Command::MeasureText {
            query_id: 1,
            text: "hi".into(),
        });
        round_trip(Command::CreateImage {
            id: ResourceId(3),
            url: "x.png".into(),
        });
        round_trip(Command::DrawImage9 {
            id: ResourceId(3),
            sx: 0.0,
            sy: 0.0,
            sw: 10.0,
            sh: 10.0,
            dx: 0.0,
            dy: 0.0,
            dw: 20.0,
            dh: 20.0,
        });
        round_trip(Command::CreateLinearGradient {
            id: ResourceId(4),
            x0: 0.0,
            y0: 0.0,
            x1: 10.0,
            y1: 10.0,
        });
        round_trip(Command::AddColorStop {
            id: ResourceId(4),
            offset: 0.5,
            color: Color {
                r: 1,
                g: 2,
                b: 3,
                a: 4,
            },
        });
        round_trip(Command::CreatePattern {
            id: ResourceId(5),
            image_id: ResourceId(3),
            repetition: PatternRepetition::RepeatX,
        });
        round_trip(Command::ReleaseResource {
            kind: ResourceKind::Gradient,
            id: ResourceId(4),
        });
        round_trip(Command::Configure {
            width: 100,
            height: 80,
            title: "demo".into(),
            background: Color {
                r: 255,
                g: 255,
                b: 255,
                a: 255,
            },
            event_mask: EventMask::MOUSE_DOWN | EventMask::RESIZE,
            cursor: CursorStyle::Default,
        });
    }

    #[test]
    fn static_rect_fixture_matches_concatenated_byte_encoding() {
        // Buffering a fill style then a fill-rect must produce the exact
        // concatenated bytes of the two individual encodings, in order.
        let mut buf = Vec::new();
        Command::SetFillStyleColor(Color {
            r: 200,
            g: 0,
            b: 0,
            a: 255,
        })
        .encode(&mut buf);
        Command::FillRect(10.0, 10.0, 50.0, 50.0).encode(&mut buf);

        let mut expected = Vec::new();
        expected.push(Opcode::SetFillStyleColor.as_u8());
        expected.extend_from_slice(&[200, 0, 0, 255]);
        expected.push(Opcode::FillRect.as_u8());
        for v in [10.0f64, 10.0, 50.0, 50.0] {
            expected.extend_from_slice(&v.to_be_bytes());
        }

        assert_eq!(buf, expected);
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let mut cursor: &[u8] = &[255];
        assert!(matches!(
            Command::decode(&mut cursor),
            Err(DecodeError::UnknownOpcode(255))
        ));
    }
}
