use super::error::BencodeError;
use super::value::Value;
use bytes::Bytes;
use std::collections::BTreeMap;

const MAX_DEPTH: usize = 64;

/// Decodes a complete bencode value.
///
/// The whole input must be consumed; anything left over after the first
/// value is rejected with [`BencodeError::TrailingData`].
pub fn decode(data: &[u8]) -> Result<Value, BencodeError> {
    let mut pos = 0;
    let value = decode_value(data, &mut pos, 0)?;

    if pos != data.len() {
        return Err(BencodeError::TrailingData);
    }

    Ok(value)
}

/// Decodes the first bencode value in `data` and returns it together with the
/// number of bytes it occupied.
pub fn decode_prefix(data: &[u8]) -> Result<(Value, usize), BencodeError> {
    let mut pos = 0;
    let value = decode_value(data, &mut pos, 0)?;
    Ok((value, pos))
}

fn decode_value(data: &[u8], pos: &mut usize, depth: usize) -> Result<Value, BencodeError> {
    if depth > MAX_DEPTH {
        return Err(BencodeError::NestingTooDeep);
    }

    if *pos >= data.len() {
        return Err(BencodeError::UnexpectedEof);
    }

    match data[*pos] {
        b'i' => decode_integer(data, pos),
        b'l' => decode_list(data, pos, depth),
        b'd' => decode_dict(data, pos, depth),
        b'0'..=b'9' => decode_bytes(data, pos),
        c => Err(BencodeError::UnexpectedChar(c as char)),
    }
}

fn decode_integer(data: &[u8], pos: &mut usize) -> Result<Value, BencodeError> {
    *pos += 1;

    let start = *pos;
    while *pos < data.len() && data[*pos] != b'e' {
        *pos += 1;
    }

    if *pos >= data.len() {
        return Err(BencodeError::UnexpectedEof);
    }

    let raw = &data[start..*pos];
    let digits = raw.strip_prefix(b"-").unwrap_or(raw);

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(BencodeError::MalformedInteger(
            String::from_utf8_lossy(raw).into_owned(),
        ));
    }

    // Canonical form only: no "-0" and no leading zeros.
    if (digits[0] == b'0' && digits.len() > 1) || (raw[0] == b'-' && digits == b"0") {
        return Err(BencodeError::MalformedInteger(
            String::from_utf8_lossy(raw).into_owned(),
        ));
    }

    // Only ASCII digits and an optional sign remain, so this is valid UTF-8.
    let int_str = std::str::from_utf8(raw)
        .map_err(|_| BencodeError::MalformedInteger("invalid utf8".into()))?;
    let value: i64 = int_str
        .parse()
        .map_err(|_| BencodeError::MalformedInteger(int_str.into()))?;

    *pos += 1;
    Ok(Value::Integer(value))
}

fn decode_bytes(data: &[u8], pos: &mut usize) -> Result<Value, BencodeError> {
    let start = *pos;
    while *pos < data.len() && data[*pos] != b':' {
        if !data[*pos].is_ascii_digit() {
            return Err(BencodeError::InvalidStringLength);
        }
        *pos += 1;
    }

    if *pos >= data.len() {
        return Err(BencodeError::UnexpectedEof);
    }

    let len_digits = &data[start..*pos];
    if len_digits.len() > 1 && len_digits[0] == b'0' {
        return Err(BencodeError::InvalidStringLength);
    }

    let len: usize = std::str::from_utf8(len_digits)
        .map_err(|_| BencodeError::InvalidStringLength)?
        .parse()
        .map_err(|_| BencodeError::InvalidStringLength)?;

    *pos += 1;

    let end = pos.checked_add(len).ok_or(BencodeError::UnexpectedEof)?;
    if end > data.len() {
        return Err(BencodeError::UnexpectedEof);
    }

    let bytes = Bytes::copy_from_slice(&data[*pos..end]);
    *pos = end;

    Ok(Value::Bytes(bytes))
}

fn decode_list(data: &[u8], pos: &mut usize, depth: usize) -> Result<Value, BencodeError> {
    *pos += 1;
    let mut list = Vec::new();

    while *pos < data.len() && data[*pos] != b'e' {
        list.push(decode_value(data, pos, depth + 1)?);
    }

    if *pos >= data.len() {
        return Err(BencodeError::UnexpectedEof);
    }

    *pos += 1;
    Ok(Value::List(list))
}

fn decode_dict(data: &[u8], pos: &mut usize, depth: usize) -> Result<Value, BencodeError> {
    *pos += 1;
    let mut dict: BTreeMap<Bytes, Value> = BTreeMap::new();

    while *pos < data.len() && data[*pos] != b'e' {
        let key = match decode_value(data, pos, depth + 1)? {
            Value::Bytes(b) => b,
            _ => return Err(BencodeError::DictKeyNotString),
        };

        if dict.contains_key(&key) {
            return Err(BencodeError::DuplicateKey(
                String::from_utf8_lossy(&key).into_owned(),
            ));
        }

        let value = decode_value(data, pos, depth + 1)?;
        dict.insert(key, value);
    }

    if *pos >= data.len() {
        return Err(BencodeError::UnexpectedEof);
    }

    *pos += 1;
    Ok(Value::Dict(dict))
}
