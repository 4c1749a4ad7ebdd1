//! Client-to-server event frames: input events forwarded from the browser, plus
//! reply events answering a prior query command (`MeasureText`, `GetImageData`, ...).

use crate::primitives::*;
use crate::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum EventTag {
    MouseMove = 0,
    MouseDown = 1,
    MouseUp = 2,
    MouseEnter = 3,
    MouseLeave = 4,
    MouseOver = 5,
    MouseOut = 6,
    Wheel = 7,
    KeyDown = 8,
    KeyUp = 9,
    KeyPress = 10,
    TouchStart = 11,
    TouchMove = 12,
    TouchEnd = 13,
    TouchCancel = 14,
    Resize = 15,
    Click = 16,
    DblClick = 17,
    AuxClick = 18,
    ContextMenu = 19,
    Focus = 20,
    Blur = 21,
    ImageLoaded = 22,
    TextMetrics = 23,
    ImageData = 24,
    PointInPath = 25,
    PointInStroke = 26,
}

impl TryFrom<u8> for EventTag {
    type Error = DecodeError;
    fn try_from(value: u8) -> Result<Self, DecodeError> {
        use EventTag::*;
        const TABLE: &[EventTag] = &[
            MouseMove, MouseDown, MouseUp, MouseEnter, MouseLeave, MouseOver, MouseOut, Wheel,
            KeyDown, KeyUp, KeyPress, TouchStart, TouchMove, TouchEnd, TouchCancel, Resize, Click,
            DblClick, AuxClick, ContextMenu, Focus, Blur, ImageLoaded, TextMetrics, ImageData,
            PointInPath, PointInStroke,
        ];
        TABLE
            .get(value as usize)
            .copied()
            .ok_or(DecodeError::UnknownOpcode(value))
    }
}

bitflags::bitflags! {
    /// Modifier keys held during a keyboard or pointer event.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL  = 1 << 1;
        const ALT   = 1 << 2;
        const META  = 1 << 3;
    }
}

bitflags::bitflags! {
    /// Mouse buttons held during a pointer event, matching `MouseEvent.buttons`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MouseButtons: u8 {
        const LEFT   = 1 << 0;
        const RIGHT  = 1 << 1;
        const MIDDLE = 1 << 2;
    }
}

/// One active touch point, as carried in `TouchStart`/`TouchMove`/`TouchEnd`/`TouchCancel`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub id: i32,
    pub x: i32,
    pub y: i32,
}

fn put_touches(buf: &mut Vec<u8>, touches: &[Touch]) {
    put_u8(buf, touches.len() as u8);
    for t in touches {
        put_i32(buf, t.id);
        put_i32(buf, t.x);
        put_i32(buf, t.y);
    }
}

fn get_touches(input: &mut &[u8]) -> Result<Vec<Touch>, DecodeError> {
    let n = get_u8(input)? as usize;
    let mut touches = Vec::with_capacity(n);
    for _ in 0..n {
        touches.push(Touch {
            id: get_i32(input)?,
            x: get_i32(input)?,
            y: get_i32(input)?,
        });
    }
    Ok(touches)
}

/// A decoded frame from the client-to-server stream: either a raw input event or a
/// reply to a previously issued query command.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    MouseMove {
        x: i32,
        y: i32,
        buttons: MouseButtons,
        modifiers: Modifiers,
    },
    MouseDown {
        x: i32,
        y: i32,
        buttons: MouseButtons,
        modifiers: Modifiers,
    },
    MouseUp {
        x: i32,
        y: i32,
        buttons: MouseButtons,
        modifiers: Modifiers,
    },
    MouseEnter {
        x: i32,
        y: i32,
        buttons: MouseButtons,
        modifiers: Modifiers,
    },
    MouseLeave {
        x: i32,
        y: i32,
        buttons: MouseButtons,
        modifiers: Modifiers,
    },
    MouseOver {
        x: i32,
        y: i32,
        buttons: MouseButtons,
        modifiers: Modifiers,
    },
    MouseOut {
        x: i32,
        y: i32,
        buttons: MouseButtons,
        modifiers: Modifiers,
    },
    Wheel {
        x: i32,
        y: i32,
        delta_x: f64,
        delta_y: f64,
        delta_z: f64,
        delta_mode: u8,
        modifiers: Modifiers,
    },
    KeyDown {
        key: String,
        code: String,
        modifiers: Modifiers,
        repeat: bool,
    },
    KeyUp {
        key: String,
        code: String,
        modifiers: Modifiers,
        repeat: bool,
    },
    KeyPress {
        key: String,
        code: String,
        modifiers: Modifiers,
        repeat: bool,
    },
    TouchStart(Vec<Touch>),
    TouchMove(Vec<Touch>),
    TouchEnd(Vec<Touch>),
    TouchCancel(Vec<Touch>),
    Resize {
        width: i32,
        height: i32,
    },
    Click {
        x: i32,
        y: i32,
        buttons: MouseButtons,
        modifiers: Modifiers,
    },
    DblClick {
        x: i32,
        y: i32,
        buttons: MouseButtons,
        modifiers: Modifiers,
    },
    AuxClick {
        x: i32,
        y: i32,
        buttons: MouseButtons,
        modifiers: Modifiers,
    },
    ContextMenu {
        x: i32,
        y: i32,
        modifiers: Modifiers,
    },
    Focus,
    Blur,
    /// Reply to `CreateImage`/`ImageLoaded`-style decode completion.
    ImageLoaded {
        id: u32,
        ok: bool,
        width: u32,
        height: u32,
    },
    /// Reply to `MeasureText`.
    TextMetrics {
        query_id: u32,
        width: f64,
        actual_bounding_box_ascent: f64,
        actual_bounding_box_descent: f64,
    },
    /// Reply to `GetImageData`.
    ImageData {
        query_id: u32,
        width: u32,
        height: u32,
        data: Vec<u8>,
    },
    /// Reply to `IsPointInPath`.
    PointInPath { query_id: u32, result: bool },
    /// Reply to `IsPointInStroke`.
    PointInStroke { query_id: u32, result: bool },
}

fn decode_mouse(
    input: &mut &[u8],
) -> Result<(i32, i32, MouseButtons, Modifiers), DecodeError> {
    let x = get_i32(input)?;
    let y = get_i32(input)?;
    let buttons = MouseButtons::from_bits_truncate(get_u8(input)?);
    let modifiers = Modifiers::from_bits_truncate(get_u8(input)?);
    Ok((x, y, buttons, modifiers))
}

fn decode_key(input: &mut &[u8]) -> Result<(String, String, Modifiers, bool), DecodeError> {
    let key = get_string(input)?;
    let code = get_string(input)?;
    let modifiers = Modifiers::from_bits_truncate(get_u8(input)?);
    let repeat = get_bool(input)?;
    Ok((key, code, modifiers, repeat))
}

impl ClientEvent {
    /// Decode one complete event frame from the front of `input`, advancing the slice.
    pub fn decode(input: &mut &[u8]) -> Result<ClientEvent, DecodeError> {
        let tag = EventTag::try_from(get_u8(input)?)?;
        Ok(match tag {
            EventTag::MouseMove => {
                let (x, y, buttons, modifiers) = decode_mouse(input)?;
                ClientEvent::MouseMove {
                    x,
                    y,
                    buttons,
                    modifiers,
                }
            }
            EventTag::MouseDown => {
                let (x, y, buttons, modifiers) = decode_mouse(input)?;
                ClientEvent::MouseDown {
                    x,
                    y,
                    buttons,
                    modifiers,
                }
            }
            EventTag::MouseUp => {
                let (x, y, buttons, modifiers) = decode_mouse(input)?;
                ClientEvent::MouseUp {
                    x,
                    y,
                    buttons,
                    modifiers,
                }
            }
            EventTag::MouseEnter => {
                let (x, y, buttons, modifiers) = decode_mouse(input)?;
                ClientEvent::MouseEnter {
                    x,
                    y,
                    buttons,
                    modifiers,
                }
            }
            EventTag::MouseLeave => {
                let (x, y, buttons, modifiers) = decode_mouse(input)?;
                ClientEvent::MouseLeave {
                    x,
                    y,
                    buttons,
                    modifiers,
                }
            }
            EventTag::MouseOver => {
                let (x, y, buttons, modifiers) = decode_mouse(input)?;
                ClientEvent::MouseOver {
                    x,
                    y,
                    buttons,
                    modifiers,
                }
            }
            EventTag::MouseOut => {
                let (x, y, buttons, modifiers) = decode_mouse(input)?;
                ClientEvent::MouseOut {
                    x,
                    y,
                    buttons,
                    modifiers,
                }
            }
            EventTag::Wheel => ClientEvent::Wheel {
                x: get_i32(input)?,
                y: get_i32(input)?,
                delta_x: get_f64(input)?,
                delta_y: get_f64(input)?,
                delta_z: get_f64(input)?,
                delta_mode: get_u8(input)?,
                modifiers: Modifiers::from_bits_truncate(get_u8(input)?),
            },
            EventTag::KeyDown => {
                let (key, code, modifiers, repeat) = decode_key(input)?;
                ClientEvent::KeyDown {
                    key,
                    code,
                    modifiers,
                    repeat,
                }
            }
            EventTag::KeyUp => {
                let (key, code, modifiers, repeat) = decode_key(input)?;
                ClientEvent::KeyUp {
                    key,
                    code,
                    modifiers,
                    repeat,
                }
            }
            EventTag::KeyPress => {
                let (key, code, modifiers, repeat) = decode_key(input)?;
                ClientEvent::KeyPress {
                    key,
                    code,
                    modifiers,
                    repeat,
                }
            }
            EventTag::TouchStart => ClientEvent::TouchStart(get_touches(input)?),
            EventTag::TouchMove => ClientEvent::TouchMove(get_touches(input)?),
            EventTag::TouchEnd => ClientEvent::TouchEnd(get_touches(input)?),
            EventTag::TouchCancel => ClientEvent::TouchCancel(get_touches(input)?),
            EventTag::Resize => ClientEvent::Resize {
                width: get_i32(input)?,
                height: get_i32(input)?,
            },
            EventTag::Click => {
                let (x, y, buttons, modifiers) = decode_mouse(input)?;
                ClientEvent::Click {
                    x,
                    y,
                    buttons,
                    modifiers,
                }
            }
            EventTag::DblClick => {
                let (x, y, buttons, modifiers) = decode_mouse(input)?;
                ClientEvent::DblClick {
                    x,
                    y,
                    buttons,
                    modifiers,
                }
            }
            EventTag::AuxClick => {
                let (x, y, buttons, modifiers) = decode_mouse(input)?;
                ClientEvent::AuxClick {
                    x,
                    y,
                    buttons,
                    modifiers,
                }
            }
            EventTag::ContextMenu => ClientEvent::ContextMenu {
                x: get_i32(input)?,
                y: get_i32(input)?,
                modifiers: Modifiers::from_bits_truncate(get_u8(input)?),
            },
            EventTag::Focus => ClientEvent::Focus,
            EventTag::Blur => ClientEvent::Blur,
            EventTag::ImageLoaded => ClientEvent::ImageLoaded {
                id: get_u32(input)?,
                ok: get_bool(input)?,
                width: get_u32(input)?,
                height: get_u32(input)?,
            },
            EventTag::TextMetrics => ClientEvent::TextMetrics {
                query_id: get_u32(input)?,
                width: get_f64(input)?,
                actual_bounding_box_ascent: get_f64(input)?,
                actual_bounding_box_descent: get_f64(input)?,
            },
            EventTag::ImageData => ClientEvent::ImageData {
                query_id: get_u32(input)?,
                width: get_u32(input)?,
                height: get_u32(input)?,
                data: get_blob(input)?,
            },
            EventTag::PointInPath => ClientEvent::PointInPath {
                query_id: get_u32(input)?,
                result: get_bool(input)?,
            },
            EventTag::PointInStroke => ClientEvent::PointInStroke {
                query_id: get_u32(input)?,
                result: get_bool(input)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: EventTag, body: impl FnOnce(&mut Vec<u8>)) -> Vec<u8> {
        let mut buf = vec![tag as u8];
        body(&mut buf);
        buf
    }

    #[test]
    fn decodes_mouse_move() {
        let bytes = frame(EventTag::MouseMove, |buf| {
            put_i32(buf, 12);
            put_i32(buf, 34);
            put_u8(buf, MouseButtons::LEFT.bits());
            put_u8(buf, Modifiers::SHIFT.bits());
        });
        let mut cursor = bytes.as_slice();
        assert_eq!(
            ClientEvent::decode(&mut cursor).unwrap(),
            ClientEvent::MouseMove {
                x: 12,
                y: 34,
                buttons: MouseButtons::LEFT,
                modifiers: Modifiers::SHIFT,
            }
        );
        assert!(cursor.is_empty());
    }

    #[test]
    fn decodes_touch_sequence() {
        let bytes = frame(EventTag::TouchStart, |buf| {
            put_touches(
                buf,
                &[
                    Touch { id: 1, x: 1, y: 2 },
                    Touch { id: 2, x: 3, y: 4 },
                ],
            );
        });
        let mut cursor = bytes.as_slice();
        assert_eq!(
            ClientEvent::decode(&mut cursor).unwrap(),
            ClientEvent::TouchStart(vec![
                Touch { id: 1, x: 1, y: 2 },
                Touch { id: 2, x: 3, y: 4 },
            ])
        );
    }

    #[test]
    fn decodes_reply_events() {
        let bytes = frame(EventTag::PointInPath, |buf| {
            put_u32(buf, 9);
            put_bool(buf, true);
        });
        let mut cursor = bytes.as_slice();
        assert_eq!(
            ClientEvent::decode(&mut cursor).unwrap(),
            ClientEvent::PointInPath {
                query_id: 9,
                result: true
            }
        );
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut cursor: &[u8] = &[200];
        assert!(matches!(
            ClientEvent::decode(&mut cursor),
            Err(DecodeError::UnknownOpcode(200))
        ));
    }
}
