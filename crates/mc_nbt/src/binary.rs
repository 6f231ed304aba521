//! Encoding and decoding of the binary NBT format used by every NBT-bearing
//! field in protocol revision 340 (item tags, chunk block entities).

use std::io::Write;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use cesu8::{from_java_cesu8, to_java_cesu8};

use crate::tag::Tag;
use crate::value::{Compound, List, Value};
use crate::{Error, Result};

/// Encodes a named root compound as uncompressed binary NBT.
///
/// The empty string is the conventional root name for every packet field
/// this proxy reads or writes.
pub fn to_binary<W: Write>(comp: &Compound, root_name: &str, mut writer: W) -> Result<()> {
    writer.write_u8(Tag::Compound.to_u8())?;
    write_string(&mut writer, root_name)?;
    write_compound(&mut writer, comp)?;
    Ok(())
}

/// Decodes a named root compound from uncompressed binary NBT, returning the
/// root name and the compound.
pub fn from_binary(r: &mut &[u8]) -> Result<(String, Compound)> {
    let tag = read_tag(r)?;
    if tag != Tag::Compound {
        return Err(Error::new(format!(
            "expected a compound at the NBT root, found {:?}",
            tag
        )));
    }
    let name = read_string(r)?;
    let comp = read_compound(r)?;
    Ok((name, comp))
}

fn write_tag<W: Write>(w: &mut W, tag: Tag) -> Result<()> {
    Ok(w.write_u8(tag.to_u8())?)
}

fn read_tag(r: &mut &[u8]) -> Result<Tag> {
    let byte = r.read_u8()?;
    Tag::from_u8(byte).ok_or_else(|| Error::new(format!("invalid NBT tag byte {byte}")))
}

fn write_string<W: Write>(w: &mut W, s: &str) -> Result<()> {
    let bytes = to_java_cesu8(s);
    if bytes.len() > u16::MAX as usize {
        return Err(Error::new("NBT string is too long"));
    }
    w.write_u16::<BigEndian>(bytes.len() as u16)?;
    w.write_all(&bytes)?;
    Ok(())
}

fn read_string(r: &mut &[u8]) -> Result<String> {
    let len = r.read_u16::<BigEndian>()? as usize;
    if r.len() < len {
        return Err(Error::new("NBT string extends past the end of the buffer"));
    }
    let (bytes, rest) = r.split_at(len);
    *r = rest;
    Ok(from_java_cesu8(bytes)
        .map_err(|_| Error::new("invalid modified UTF-8 in NBT string"))?
        .into_owned())
}

fn write_value<W: Write>(w: &mut W, v: &Value) -> Result<()> {
    match v {
        Value::Byte(n) => Ok(w.write_i8(*n)?),
        Value::Short(n) => Ok(w.write_i16::<BigEndian>(*n)?),
        Value::Int(n) => Ok(w.write_i32::<BigEndian>(*n)?),
        Value::Long(n) => Ok(w.write_i64::<BigEndian>(*n)?),
        Value::Float(n) => Ok(w.write_f32::<BigEndian>(*n)?),
        Value::Double(n) => Ok(w.write_f64::<BigEndian>(*n)?),
        Value::ByteArray(a) => {
            w.write_i32::<BigEndian>(a.len() as i32)?;
            for b in a {
                w.write_i8(*b)?;
            }
            Ok(())
        }
        Value::String(s) => write_string(w, s),
        Value::List(l) => write_list(w, l),
        Value::Compound(c) => write_compound(w, c),
        Value::IntArray(a) => {
            w.write_i32::<BigEndian>(a.len() as i32)?;
            for n in a {
                w.write_i32::<BigEndian>(*n)?;
            }
            Ok(())
        }
        Value::LongArray(a) => {
            w.write_i32::<BigEndian>(a.len() as i32)?;
            for n in a {
                w.write_i64::<BigEndian>(*n)?;
            }
            Ok(())
        }
    }
}

fn write_compound<W: Write>(w: &mut W, c: &Compound) -> Result<()> {
    for (name, value) in c {
        write_tag(w, value.tag())?;
        write_string(w, name)?;
        write_value(w, value)?;
    }
    write_tag(w, Tag::End)
}

fn write_list<W: Write>(w: &mut W, l: &List) -> Result<()> {
    write_tag(w, l.element_tag())?;
    w.write_i32::<BigEndian>(l.len() as i32)?;

    macro_rules! write_elems {
        ($items:expr, |$item:ident| $write:expr) => {
            for $item in $items {
                $write;
            }
        };
    }

    match l {
        List::End => {}
        List::Byte(v) => write_elems!(v, |b| w.write_i8(*b)?),
        List::Short(v) => write_elems!(v, |n| w.write_i16::<BigEndian>(*n)?),
        List::Int(v) => write_elems!(v, |n| w.write_i32::<BigEndian>(*n)?),
        List::Long(v) => write_elems!(v, |n| w.write_i64::<BigEndian>(*n)?),
        List::Float(v) => write_elems!(v, |n| w.write_f32::<BigEndian>(*n)?),
        List::Double(v) => write_elems!(v, |n| w.write_f64::<BigEndian>(*n)?),
        List::ByteArray(v) => {
            for a in v {
                w.write_i32::<BigEndian>(a.len() as i32)?;
                for b in a {
                    w.write_i8(*b)?;
                }
            }
        }
        List::String(v) => {
            for s in v {
                write_string(w, s)?;
            }
        }
        List::List(v) => {
            for inner in v {
                write_list(w, inner)?;
            }
        }
        List::Compound(v) => {
            for c in v {
                write_compound(w, c)?;
            }
        }
        List::IntArray(v) => {
            for a in v {
                w.write_i32::<BigEndian>(a.len() as i32)?;
                for n in a {
                    w.write_i32::<BigEndian>(*n)?;
                }
            }
        }
        List::LongArray(v) => {
            for a in v {
                w.write_i32::<BigEndian>(a.len() as i32)?;
                for n in a {
                    w.write_i64::<BigEndian>(*n)?;
                }
            }
        }
    }

    Ok(())
}

fn read_value(r: &mut &[u8], tag: Tag) -> Result<Value> {
    Ok(match tag {
        Tag::End => return Err(Error::new("unexpected TAG_End where a value was expected")),
        Tag::Byte => Value::Byte(r.read_i8()?),
        Tag::Short => Value::Short(r.read_i16::<BigEndian>()?),
        Tag::Int => Value::Int(r.read_i32::<BigEndian>()?),
        Tag::Long => Value::Long(r.read_i64::<BigEndian>()?),
        Tag::Float => Value::Float(r.read_f32::<BigEndian>()?),
        Tag::Double => Value::Double(r.read_f64::<BigEndian>()?),
        Tag::ByteArray => {
            let len = read_array_len(r)?;
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(r.read_i8()?);
            }
            Value::ByteArray(v)
        }
        Tag::String => Value::String(read_string(r)?),
        Tag::List => Value::List(read_list(r)?),
        Tag::Compound => Value::Compound(read_compound(r)?),
        Tag::IntArray => {
            let len = read_array_len(r)?;
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(r.read_i32::<BigEndian>()?);
            }
            Value::IntArray(v)
        }
        Tag::LongArray => {
            let len = read_array_len(r)?;
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(r.read_i64::<BigEndian>()?);
            }
            Value::LongArray(v)
        }
    })
}

fn read_array_len(r: &mut &[u8]) -> Result<usize> {
    let len = r.read_i32::<BigEndian>()?;
    if len < 0 {
        return Err(Error::new("negative NBT array length"));
    }
    Ok(len as usize)
}

fn read_compound(r: &mut &[u8]) -> Result<Compound> {
    let mut comp = Compound::new();
    loop {
        let tag = read_tag(r)?;
        if tag == Tag::End {
            return Ok(comp);
        }
        let name = read_string(r)?;
        let value = read_value(r, tag)?;
        comp.insert(name, value);
    }
}

fn read_list(r: &mut &[u8]) -> Result<List> {
    let elem_tag = read_tag(r)?;
    let len = read_array_len(r)?;

    Ok(match elem_tag {
        Tag::End => List::End,
        Tag::Byte => List::Byte(read_n(r, len, |r| Ok(r.read_i8()?))?),
        Tag::Short => List::Short(read_n(r, len, |r| Ok(r.read_i16::<BigEndian>()?))?),
        Tag::Int => List::Int(read_n(r, len, |r| Ok(r.read_i32::<BigEndian>()?))?),
        Tag::Long => List::Long(read_n(r, len, |r| Ok(r.read_i64::<BigEndian>()?))?),
        Tag::Float => List::Float(read_n(r, len, |r| Ok(r.read_f32::<BigEndian>()?))?),
        Tag::Double => List::Double(read_n(r, len, |r| Ok(r.read_f64::<BigEndian>()?))?),
        Tag::ByteArray => List::ByteArray(read_n(r, len, |r| {
            let inner_len = read_array_len(r)?;
            read_n(r, inner_len, |r| Ok(r.read_i8()?))
        })?),
        Tag::String => List::String(read_n(r, len, read_string)?),
        Tag::List => List::List(read_n(r, len, read_list)?),
        Tag::Compound => List::Compound(read_n(r, len, read_compound)?),
        Tag::IntArray => List::IntArray(read_n(r, len, |r| {
            let inner_len = read_array_len(r)?;
            read_n(r, inner_len, |r| Ok(r.read_i32::<BigEndian>()?))
        })?),
        Tag::LongArray => List::LongArray(read_n(r, len, |r| {
            let inner_len = read_array_len(r)?;
            read_n(r, inner_len, |r| Ok(r.read_i64::<BigEndian>()?))
        })?),
    })
}

fn read_n<T>(
    r: &mut &[u8],
    len: usize,
    mut f: impl FnMut(&mut &[u8]) -> Result<T>,
) -> Result<Vec<T>> {
    let mut v = Vec::with_capacity(len.min(1 << 16));
    for _ in 0..len {
        v.push(f(r)?);
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Compound {
        let mut root = Compound::new();
        root.insert("byte".to_owned(), Value::Byte(-1));
        root.insert("int".to_owned(), Value::Int(42));
        root.insert(
            "name".to_owned(),
            Value::String("a pickaxe of legend".to_owned()),
        );
        root.insert(
            "enchantments".to_owned(),
            Value::List(List::Int(vec![1, 2, 3])),
        );
        let mut nested = Compound::new();
        nested.insert("inner".to_owned(), Value::Long(-99));
        root.insert("nested".to_owned(), Value::Compound(nested));
        root
    }

    #[test]
    fn round_trips_a_representative_compound() {
        let comp = sample();
        let mut buf = Vec::new();
        to_binary(&comp, "", &mut buf).unwrap();

        let mut slice = buf.as_slice();
        let (name, decoded) = from_binary(&mut slice).unwrap();

        assert_eq!(name, "");
        assert_eq!(decoded, comp);
        assert!(slice.is_empty());
    }

    #[test]
    fn round_trips_an_empty_compound() {
        let comp = Compound::new();
        let mut buf = Vec::new();
        to_binary(&comp, "", &mut buf).unwrap();

        let mut slice = buf.as_slice();
        let (_, decoded) = from_binary(&mut slice).unwrap();
        assert_eq!(decoded, comp);
    }

    #[test]
    fn rejects_truncated_input() {
        let comp = sample();
        let mut buf = Vec::new();
        to_binary(&comp, "", &mut buf).unwrap();
        buf.truncate(buf.len() - 3);

        let mut slice = buf.as_slice();
        assert!(from_binary(&mut slice).is_err());
    }
}
