//! Fast Fourier transforms.

use crate::attributes::{AttributeValue, FftType};
use crate::errors::Error;
use crate::functions::FunctionBuilder;
use crate::operations::OpType;
use crate::shape_inference::spectral;
use crate::values::Value;

pub const FFT_TYPE_ATTRIBUTE: &'static str = "fft_type";
pub const FFT_LENGTH_ATTRIBUTE: &'static str = "fft_length";

impl<'p> FunctionBuilder<'p> {
    /// Appends a fast Fourier transform of the trailing `lengths.len()` axes of `operand`.
    pub fn fft(&mut self, operand: Value, fft_type: FftType, lengths: &[usize]) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[operand])?;
        let output = spectral::fft(&shapes[0], fft_type, lengths)?;
        let lengths = lengths.iter().map(|length| *length as i64).collect::<Vec<_>>();
        let attributes = vec![
            (FFT_TYPE_ATTRIBUTE, AttributeValue::literal(&fft_type)),
            (FFT_LENGTH_ATTRIBUTE, AttributeValue::i64_array(&lengths)),
        ];
        self.append_single(OpType::Fft, &[operand], attributes, Vec::new(), output)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::attributes::FftType;
    use crate::errors::Error;
    use crate::programs::Program;
    use crate::shape_inference::ShapeError;
    use crate::types::{DataType, Shape};

    #[test]
    fn test_fft() {
        let mut program = Program::new("test");
        let main = program.function("main", &[Shape::new(DataType::Float32, [3, 8])]).unwrap();
        let mut builder = program.builder(main).unwrap();
        let x = builder.inputs()[0];
        let spectrum = builder.fft(x, FftType::Rfft, &[8]).unwrap();
        let signal = builder.fft(spectrum, FftType::Irfft, &[8]).unwrap();
        assert_eq!(builder.shape(spectrum).unwrap(), &Shape::new(DataType::Complex64, [3, 5]));
        assert_eq!(builder.shape(signal).unwrap(), &Shape::new(DataType::Float32, [3, 8]));
        builder.r#return(&[signal]).unwrap();
        assert!(program.build().unwrap().contains(concat!(
            "    %0 = \"stablehlo.fft\"(%arg0) {\n",
            "      fft_length = array<i64: 8>,\n",
            "      fft_type = #stablehlo<fft_type RFFT>\n",
            "    } : (tensor<3x8xf32>) -> tensor<3x5xcomplex<f32>>\n",
        )));
    }

    #[test]
    fn test_fft_rejects_invalid_operands() {
        let mut program = Program::new("test");
        let main = program.function("main", &[Shape::new(DataType::Float32, [3, 8])]).unwrap();
        let mut builder = program.builder(main).unwrap();
        let x = builder.inputs()[0];
        assert!(matches!(
            builder.fft(x, FftType::Fft, &[8]),
            Err(Error::Shape(ShapeError::UnsupportedDataType { .. })),
        ));
        assert!(builder.fft(x, FftType::Rfft, &[2, 2, 2, 2]).is_err());
        assert!(builder.fft(x, FftType::Rfft, &[4]).is_err());
        assert!(builder.function().statements().is_empty());
    }
}
