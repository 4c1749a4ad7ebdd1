//! Fixed-width, big-endian primitive encoders/decoders shared by commands and events.
//!
//! Every helper here appends to or consumes from a flat byte cursor. Decoders take
//! `&mut &[u8]` so callers can chain several reads and have the slice advance in place.

use crate::DecodeError;

pub fn put_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

pub fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

pub fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

pub fn put_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

pub fn put_f64(buf: &mut Vec<u8>, v: f64) {
    buf.extend_from_slice(&v.to_be_bytes());
}

pub fn put_bool(buf: &mut Vec<u8>, v: bool) {
    buf.push(if v { 1 } else { 0 });
}

pub fn put_string(buf: &mut Vec<u8>, s: &str) {
    put_u32(buf, s.len() as u32);
    buf.extend_from_slice(s.as_bytes());
}

pub fn put_blob(buf: &mut Vec<u8>, bytes: &[u8]) {
    put_u32(buf, bytes.len() as u32);
    buf.extend_from_slice(bytes);
}

pub fn put_color(buf: &mut Vec<u8>, c: crate::Color) {
    buf.push(c.r);
    buf.push(c.g);
    buf.push(c.b);
    buf.push(c.a);
}

fn take<'a>(input: &mut &'a [u8], n: usize) -> Result<&'a [u8], DecodeError> {
    if input.len() < n {
        return Err(DecodeError::Truncated);
    }
    let (head, tail) = input.split_at(n);
    *input = tail;
    Ok(head)
}

pub fn get_u8(input: &mut &[u8]) -> Result<u8, DecodeError> {
    Ok(take(input, 1)?[0])
}

pub fn get_u16(input: &mut &[u8]) -> Result<u16, DecodeError> {
    let bytes = take(input, 2)?;
    Ok(u16::from_be_bytes(bytes.try_into().unwrap()))
}

pub fn get_u32(input: &mut &[u8]) -> Result<u32, DecodeError> {
    let bytes = take(input, 4)?;
    Ok(u32::from_be_bytes(bytes.try_into().unwrap()))
}

pub fn get_i32(input: &mut &[u8]) -> Result<i32, DecodeError> {
    let bytes = take(input, 4)?;
    Ok(i32::from_be_bytes(bytes.try_into().unwrap()))
}

pub fn get_f64(input: &mut &[u8]) -> Result<f64, DecodeError> {
    let bytes = take(input, 8)?;
    Ok(f64::from_be_bytes(bytes.try_into().unwrap()))
}

pub fn get_bool(input: &mut &[u8]) -> Result<bool, DecodeError> {
    Ok(get_u8(input)? != 0)
}

pub fn get_string(input: &mut &[u8]) -> Result<String, DecodeError> {
    let len = get_u32(input)? as usize;
    let bytes = take(input, len)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
}

pub fn get_blob(input: &mut &[u8]) -> Result<Vec<u8>, DecodeError> {
    let len = get_u32(input)? as usize;
    Ok(take(input, len)?.to_vec())
}

pub fn get_color(input: &mut &[u8]) -> Result<crate::Color, DecodeError> {
    let r = get_u8(input)?;
    let g = get_u8(input)?;
    let b = get_u8(input)?;
    let a = get_u8(input)?;
    Ok(crate::Color { r, g, b, a })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_primitive() {
        let mut buf = Vec::new();
        put_u8(&mut buf, 7);
        put_u16(&mut buf, 4000);
        put_u32(&mut buf, 123_456_789);
        put_i32(&mut buf, -42);
        put_f64(&mut buf, 18.5);
        put_bool(&mut buf, true);
        put_string(&mut buf, "hi");
        put_blob(&mut buf, &[1, 2, 3]);
        put_color(
            &mut buf,
            crate::Color {
                r: 200,
                g: 0,
                b: 0,
                a: 255,
            },
        );

        let mut cursor = buf.as_slice();
        assert_eq!(get_u8(&mut cursor).unwrap(), 7);
        assert_eq!(get_u16(&mut cursor).unwrap(), 4000);
        assert_eq!(get_u32(&mut cursor).unwrap(), 123_456_789);
        assert_eq!(get_i32(&mut cursor).unwrap(), -42);
        assert_eq!(get_f64(&mut cursor).unwrap(), 18.5);
        assert!(get_bool(&mut cursor).unwrap());
        assert_eq!(get_string(&mut cursor).unwrap(), "hi");
        assert_eq!(get_blob(&mut cursor).unwrap(), vec![1, 2, 3]);
        assert_eq!(
            get_color(&mut cursor).unwrap(),
            crate::Color {
                r: 200,
                g: 0,
                b: 0,
                a: 255
            }
        );
        assert!(cursor.is_empty());
    }

    #[test]
    fn truncated_input_is_an_error() {
        let mut cursor: &[u8] = &[0, 0];
        assert!(matches!(get_u32(&mut cursor), Err(DecodeError::Truncated)));
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let mut buf = Vec::new();
        put_u32(&mut buf, 1);
        buf.push(0xFF);
        let mut cursor = buf.as_slice();
        assert!(matches!(
            get_string(&mut cursor),
            Err(DecodeError::InvalidUtf8)
        ));
    }
}
