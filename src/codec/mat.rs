//! codec::mat
//!
//! MATLAB level 5 MAT-file payloads.
//!
//! # Layout
//!
//! Written files are uncompressed, little-endian, and hold a single numeric
//! variable named after the array:
//!
//! ```text
//! header (128 bytes): text, subsystem offset, version 0x0100, "IM"
//! miMATRIX
//!   array flags   (class)
//!   dimensions    (int32, column-major)
//!   array name    (int8)
//!   real part     (element type matching the class)
//! ```
//!
//! MAT variables have at least two dimensions, so a rank-1 array of length
//! N is stored (and decoded) as `1×N`, and a scalar as `1×1`. Reading goes
//! through `matfile`, which also accepts compressed files written by
//! MATLAB; the variable named after the array is used, falling back to the
//! first variable in the file.
//!
//! Array names are not always valid MATLAB identifiers, so the variable
//! name is derived from the array name: every character outside
//! `[A-Za-z0-9_]` becomes `_`, an `x` is prepended unless the name starts
//! with a letter, and the result is cut to 63 characters.

use ndarray::{ArrayD, IxDyn, ShapeBuilder};

use super::{ArrayData, Codec, CodecError, Decoded, Format};

const HEADER_TEXT_LEN: usize = 116;
const VERSION: u16 = 0x0100;

const MI_INT8: u32 = 1;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_MATRIX: u32 = 14;

/// `namelengthmax` in MATLAB.
const MAX_NAME_LEN: usize = 63;

/// The `.mat` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatCodec;

trait MatElement: Copy {
    /// mxCLASS code
    const CLASS: u32;
    /// miTYPE code of the stored elements
    const DATA_TYPE: u32;
    fn put(self, out: &mut Vec<u8>);
}

macro_rules! impl_mat_element {
    ($ty:ty, $class:expr, $data_type:expr) => {
        impl MatElement for $ty {
            const CLASS: u32 = $class;
            const DATA_TYPE: u32 = $data_type;

            fn put(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }
        }
    };
}

impl_mat_element!(f64, 6, 9);
impl_mat_element!(f32, 7, 7);
impl_mat_element!(i64, 14, 12);
impl_mat_element!(i32, 12, 5);
impl_mat_element!(i16, 10, 3);
impl_mat_element!(u8, 9, 2);

fn too_large(shape: &[usize]) -> CodecError {
    CodecError::InvalidShape {
        format: Format::Mat,
        shape: shape.to_vec(),
        reason: "exceeds MAT-file size limits",
    }
}

/// Append one data element (tag + payload), padded to 8 bytes.
fn element(out: &mut Vec<u8>, data_type: u32, payload: &[u8]) -> Result<(), CodecError> {
    let len = u32::try_from(payload.len())
        .map_err(|_| CodecError::encode(Format::Mat, "element larger than 4 GiB"))?;
    out.extend_from_slice(&data_type.to_le_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(payload);
    let padding = (8 - payload.len() % 8) % 8;
    out.resize(out.len() + padding, 0);
    Ok(())
}

/// The MATLAB variable name for array `name`.
fn variable_name(name: &str) -> String {
    let mut variable: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if !variable.starts_with(|c: char| c.is_ascii_alphabetic()) {
        variable.insert(0, 'x');
    }
    variable.truncate(MAX_NAME_LEN);
    variable
}

fn header() -> Vec<u8> {
    let mut out = format!(
        "MATLAB 5.0 MAT-file, Platform: {}, Created by: jbof {}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    )
    .into_bytes();
    out.resize(HEADER_TEXT_LEN, b' ');
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(b"IM");
    out
}

fn write_matrix<T: MatElement>(name: &str, arr: &ArrayD<T>) -> Result<Vec<u8>, CodecError> {
    let dims: Vec<usize> = match arr.shape() {
        [] => vec![1, 1],
        [n] => vec![1, *n],
        shape => shape.to_vec(),
    };

    let mut flags = Vec::with_capacity(8);
    flags.extend_from_slice(&T::CLASS.to_le_bytes());
    flags.extend_from_slice(&0u32.to_le_bytes());

    let mut dim_bytes = Vec::with_capacity(dims.len() * 4);
    for &dim in &dims {
        let dim = i32::try_from(dim).map_err(|_| too_large(arr.shape()))?;
        dim_bytes.extend_from_slice(&dim.to_le_bytes());
    }

    // Column-major element order is row-major order of the transpose.
    let mut real = Vec::with_capacity(arr.len() * std::mem::size_of::<T>());
    for &value in arr.t().iter() {
        value.put(&mut real);
    }

    let mut matrix = Vec::new();
    element(&mut matrix, MI_UINT32, &flags)?;
    element(&mut matrix, MI_INT32, &dim_bytes)?;
    element(&mut matrix, MI_INT8, variable_name(name).as_bytes())?;
    element(&mut matrix, T::DATA_TYPE, &real)?;

    let mut out = header();
    element(&mut out, MI_MATRIX, &matrix)?;
    Ok(out)
}

fn fortran<T>(dims: &[usize], values: Vec<T>) -> Result<ArrayD<T>, CodecError> {
    ArrayD::from_shape_vec(IxDyn(dims).f(), values).map_err(|e| CodecError::decode(Format::Mat, e))
}

fn widen<T: Copy, U: From<T>>(values: &[T]) -> Vec<U> {
    values.iter().map(|&v| U::from(v)).collect()
}

impl Codec for MatCodec {
    fn format(&self) -> Format {
        Format::Mat
    }

    fn encode(
        &self,
        name: &str,
        data: &ArrayData,
        _samplerate: Option<u32>,
    ) -> Result<Vec<u8>, CodecError> {
        with_array!(data, arr => write_matrix(name, arr))
    }

    fn decode(&self, name: &str, bytes: &[u8]) -> Result<Decoded, CodecError> {
        use matfile::NumericData;

        let file = matfile::MatFile::parse(bytes)
            .map_err(|e| CodecError::decode(Format::Mat, format!("{:?}", e)))?;
        let array = file
            .find_by_name(&variable_name(name))
            .or_else(|| file.arrays().first())
            .ok_or_else(|| CodecError::decode(Format::Mat, "file holds no numeric variables"))?;
        let dims = array.size().as_slice();

        let data = match array.data() {
            NumericData::Double { real, imag: None } => {
                ArrayData::from(fortran(dims, real.clone())?)
            }
            NumericData::Single { real, imag: None } => {
                ArrayData::from(fortran(dims, real.clone())?)
            }
            NumericData::Int64 { real, imag: None } => {
                ArrayData::from(fortran(dims, real.clone())?)
            }
            NumericData::Int32 { real, imag: None } => {
                ArrayData::from(fortran(dims, real.clone())?)
            }
            NumericData::Int16 { real, imag: None } => {
                ArrayData::from(fortran(dims, real.clone())?)
            }
            NumericData::UInt8 { real, imag: None } => {
                ArrayData::from(fortran(dims, real.clone())?)
            }
            NumericData::Int8 { real, imag: None } => {
                ArrayData::from(fortran::<i16>(dims, widen(real))?)
            }
            NumericData::UInt16 { real, imag: None } => {
                ArrayData::from(fortran::<i32>(dims, widen(real))?)
            }
            NumericData::UInt32 { real, imag: None } => {
                ArrayData::from(fortran::<i64>(dims, widen(real))?)
            }
            NumericData::UInt64 { .. } => {
                return Err(CodecError::decode(
                    Format::Mat,
                    "uint64 variables are not supported",
                ))
            }
            _ => {
                return Err(CodecError::decode(
                    Format::Mat,
                    "complex variables are not supported",
                ))
            }
        };
        Ok(Decoded::plain(data))
    }
}
