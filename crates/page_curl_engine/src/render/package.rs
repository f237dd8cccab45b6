//! Compiled material package codec
//!
//! A package is a flat sequence of chunks. Each chunk is an 8-byte ASCII tag
//! (packed big-endian into a `u64`), a little-endian `u32` payload size, then
//! the payload. Chunks with unrecognised tags are skipped.
//!
//! | Tag        | Payload                                                     |
//! |------------|-------------------------------------------------------------|
//! | `MAT_NAME` | UTF-8 material name                                         |
//! | `MAT_PARM` | `u8` count, then per entry: `u8` name length, name, `u8` type |
//! | `MAT_SHDR` | opaque program blob (optional)                              |

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// Pack an 8-character ASCII tag into its chunk identifier
pub const fn chunk_tag(name: &[u8; 8]) -> u64 {
    u64::from_be_bytes(*name)
}

/// Material name chunk
pub const MATERIAL_NAME: u64 = chunk_tag(b"MAT_NAME");
/// Parameter table chunk
pub const MATERIAL_PARAMETERS: u64 = chunk_tag(b"MAT_PARM");
/// Program blob chunk
pub const MATERIAL_PROGRAM: u64 = chunk_tag(b"MAT_SHDR");

const CHUNK_HEADER_SIZE: usize = 12;

/// Type of a material parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterType {
    /// Scalar float uniform
    Float,
    /// Three-component float uniform
    Float3,
    /// Four-component float uniform
    Float4,
    /// 2D texture sampler
    Sampler2d,
}

impl ParameterType {
    /// Wire code used in the parameter table
    pub const fn code(self) -> u8 {
        match self {
            Self::Float => 0,
            Self::Float3 => 1,
            Self::Float4 => 2,
            Self::Sampler2d => 3,
        }
    }

    /// Decode a wire code
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Float),
            1 => Some(Self::Float3),
            2 => Some(Self::Float4),
            3 => Some(Self::Sampler2d),
            _ => None,
        }
    }

    /// Check whether the parameter lives in the uniform block
    pub const fn is_uniform(self) -> bool {
        !matches!(self, Self::Sampler2d)
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Float => "float",
            Self::Float3 => "float3",
            Self::Float4 => "float4",
            Self::Sampler2d => "sampler2d",
        };
        f.write_str(name)
    }
}

/// A named parameter declared by a material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    /// Parameter name as referenced by setters
    pub name: String,
    /// Declared type
    pub ty: ParameterType,
}

impl ParameterDescriptor {
    /// Create a descriptor
    pub fn new(name: impl Into<String>, ty: ParameterType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Package decoding and encoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackageError {
    /// Payload ended inside a chunk header or body
    #[error("Package truncated at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        /// Offset where the read started
        offset: usize,
        /// Bytes required
        needed: usize,
        /// Bytes remaining
        available: usize,
    },

    /// A required chunk is absent
    #[error("Package is missing required chunk {0}")]
    MissingChunk(&'static str),

    /// A chunk that may appear once appeared again
    #[error("Package contains duplicate chunk {0}")]
    DuplicateChunk(&'static str),

    /// Material or parameter name is not valid UTF-8
    #[error("Package contains an invalid UTF-8 name")]
    InvalidName,

    /// Parameter type code is not recognised
    #[error("Parameter '{name}' has unknown type code {code}")]
    UnknownParameterType {
        /// Parameter name
        name: String,
        /// Offending code
        code: u8,
    },

    /// Two parameters share a name
    #[error("Parameter '{0}' declared more than once")]
    DuplicateParameter(String),

    /// Parameter table has bytes after its last entry
    #[error("Parameter table has {0} trailing bytes")]
    TrailingBytes(usize),

    /// Name too long or too many parameters to encode
    #[error("Cannot encode package: {0}")]
    Encode(String),
}

/// Decoded contents of a material package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialPackage {
    /// Material name
    pub name: String,
    /// Declared parameters, in package order
    pub parameters: Vec<ParameterDescriptor>,
    /// Program blob, empty if the package carries none
    pub program: Vec<u8>,
}

impl MaterialPackage {
    /// Decode a package from its serialized bytes
    pub fn parse(bytes: &[u8]) -> Result<Self, PackageError> {
        let mut name = None;
        let mut parameters = None;
        let mut program = None;

        let mut reader = ByteReader::new(bytes);
        while !reader.is_empty() {
            let header = reader.take(CHUNK_HEADER_SIZE)?;
            let (tag_bytes, size_bytes) = header.split_at(8);
            let tag = u64::from_be_bytes(to_array(tag_bytes));
            let size = u32::from_le_bytes(to_array(size_bytes)) as usize;
            let body = reader.take(size)?;

            match tag {
                MATERIAL_NAME => {
                    let value = std::str::from_utf8(body).map_err(|_| PackageError::InvalidName)?;
                    set_once(&mut name, value.to_string(), "MAT_NAME")?;
                }
                MATERIAL_PARAMETERS => {
                    set_once(&mut parameters, parse_parameters(body)?, "MAT_PARM")?;
                }
                MATERIAL_PROGRAM => {
                    set_once(&mut program, body.to_vec(), "MAT_SHDR")?;
                }
                other => {
                    log::trace!("Skipping unknown package chunk {:#018x} ({} bytes)", other, size);
                }
            }
        }

        Ok(Self {
            name: name.ok_or(PackageError::MissingChunk("MAT_NAME"))?,
            parameters: parameters.ok_or(PackageError::MissingChunk("MAT_PARM"))?,
            program: program.unwrap_or_default(),
        })
    }

    /// Look up a declared parameter by name
    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, chunk: &'static str) -> Result<(), PackageError> {
    if slot.is_some() {
        return Err(PackageError::DuplicateChunk(chunk));
    }
    *slot = Some(value);
    Ok(())
}

fn parse_parameters(body: &[u8]) -> Result<Vec<ParameterDescriptor>, PackageError> {
    let mut reader = ByteReader::new(body);
    let count = reader.u8()? as usize;
    let mut seen = HashSet::with_capacity(count);
    let mut parameters = Vec::with_capacity(count);

    for _ in 0..count {
        let name_len = reader.u8()? as usize;
        let name = std::str::from_utf8(reader.take(name_len)?)
            .map_err(|_| PackageError::InvalidName)?
            .to_string();
        let code = reader.u8()?;
        let ty = ParameterType::from_code(code)
            .ok_or_else(|| PackageError::UnknownParameterType { name: name.clone(), code })?;

        if !seen.insert(name.clone()) {
            return Err(PackageError::DuplicateParameter(name));
        }
        parameters.push(ParameterDescriptor { name, ty });
    }

    if !reader.is_empty() {
        return Err(PackageError::TrailingBytes(reader.remaining()));
    }

    Ok(parameters)
}

fn to_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut array = [0u8; N];
    array.copy_from_slice(bytes);
    array
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    const fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], PackageError> {
        if len > self.remaining() {
            return Err(PackageError::Truncated {
                offset: self.offset,
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, PackageError> {
        Ok(self.take(1)?[0])
    }
}

/// Encoder for material packages
#[derive(Debug, Clone)]
pub struct PackageWriter {
    name: String,
    parameters: Vec<ParameterDescriptor>,
    program: Option<Vec<u8>>,
}

impl PackageWriter {
    /// Start a package for the named material
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            program: None,
        }
    }

    /// Declare a parameter
    pub fn parameter(mut self, name: impl Into<String>, ty: ParameterType) -> Self {
        self.parameters.push(ParameterDescriptor::new(name, ty));
        self
    }

    /// Attach a program blob
    pub fn program(mut self, program: impl Into<Vec<u8>>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Serialize the package
    pub fn build(&self) -> Result<Vec<u8>, PackageError> {
        let mut table = Vec::new();
        let count = u8::try_from(self.parameters.len())
            .map_err(|_| PackageError::Encode(format!("{} parameters", self.parameters.len())))?;
        table.push(count);
        for parameter in &self.parameters {
            let name_len = u8::try_from(parameter.name.len())
                .map_err(|_| PackageError::Encode(format!("parameter name '{}' too long", parameter.name)))?;
            table.push(name_len);
            table.extend_from_slice(parameter.name.as_bytes());
            table.push(parameter.ty.code());
        }

        let mut out = Vec::new();
        write_chunk(&mut out, MATERIAL_NAME, self.name.as_bytes())?;
        write_chunk(&mut out, MATERIAL_PARAMETERS, &table)?;
        if let Some(program) = &self.program {
            write_chunk(&mut out, MATERIAL_PROGRAM, program)?;
        }
        Ok(out)
    }
}

fn write_chunk(out: &mut Vec<u8>, tag: u64, body: &[u8]) -> Result<(), PackageError> {
    let size = u32::try_from(body.len())
        .map_err(|_| PackageError::Encode(format!("chunk of {} bytes", body.len())))?;
    out.extend_from_slice(&tag.to_be_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(body);
    Ok(())
}
