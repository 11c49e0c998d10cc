//! Fast Fourier transforms.

use crate::attributes::FftType;
use crate::operations::OpType;
use crate::shape_inference::{ShapeError, valid_data_type};
use crate::types::Shape;

/// Maximum number of trailing axes that a single FFT can transform.
pub const MAX_FFT_RANK: usize = 3;

/// Infers the output shape of a fast Fourier transform over the trailing `lengths.len()` axes of `operand`.
///
/// Complex-to-complex transforms ([`FftType::Fft`] and [`FftType::Ifft`]) preserve the operand shape. A real-to-complex
/// transform ([`FftType::Rfft`]) takes a real operand whose trailing axes match `lengths` and keeps only the
/// `length / 2 + 1` non-redundant entries of the last transformed axis, while a complex-to-real transform
/// ([`FftType::Irfft`]) does the reverse.
pub fn fft(operand: &Shape, fft_type: FftType, lengths: &[usize]) -> Result<Shape, ShapeError> {
    let op = OpType::Fft;
    let data_type = valid_data_type(op, operand)?;
    if lengths.is_empty() || lengths.len() > MAX_FFT_RANK {
        return Err(ShapeError::InvalidParameter {
            op,
            parameter: "fft_length",
            message: format!("expected between 1 and {MAX_FFT_RANK} lengths but got {}", lengths.len()),
        });
    }
    let rank = operand.rank();
    if rank < lengths.len() {
        return Err(ShapeError::RankMismatch { op, expected: lengths.len(), shape: operand.clone() });
    }

    let (output_data_type, expected) = match fft_type {
        FftType::Fft | FftType::Ifft => (data_type.is_complex().then_some(data_type), "a complex type"),
        FftType::Rfft => (data_type.complex_counterpart(), "'f32' or 'f64'"),
        FftType::Irfft => (data_type.real_counterpart(), "a complex type"),
    };
    let output_data_type = output_data_type.ok_or(ShapeError::UnsupportedDataType { op, data_type, expected })?;

    let last = lengths.len() - 1;
    let transformed = &operand.dimensions()[rank - lengths.len()..];
    let mut output_dimensions = operand.dimensions().to_vec();
    for (index, (size, length)) in transformed.iter().zip(lengths).enumerate() {
        let expected_size = match fft_type {
            FftType::Irfft if index == last => length / 2 + 1,
            _ => *length,
        };
        if *size != expected_size {
            return Err(ShapeError::InvalidParameter {
                op,
                parameter: "fft_length",
                message: format!("length {length} does not match the transformed axes of {operand}"),
            });
        }
    }
    output_dimensions[rank - 1] = match fft_type {
        FftType::Fft | FftType::Ifft => output_dimensions[rank - 1],
        FftType::Rfft => lengths[last] / 2 + 1,
        FftType::Irfft => lengths[last],
    };
    Ok(Shape::new(output_data_type, output_dimensions))
}
