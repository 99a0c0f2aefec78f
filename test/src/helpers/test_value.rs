use netsync::{BitReader, BitWrite, SerdeErr, SyncValue};

/// The value type the test host synchronizes: enough variants to exercise
/// scalar and vector approximate comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum TestValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    Vec3(f32, f32, f32),
}

impl TestValue {
    pub fn as_float(&self) -> Option<f32> {
        match self {
            TestValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<(f32, f32, f32)> {
        match self {
            TestValue::Vec3(x, y, z) => Some((*x, *y, *z)),
            _ => None,
        }
    }
}

impl SyncValue for TestValue {
    fn equal_approx(&self, other: &Self, tolerance: f32) -> bool {
        match (self, other) {
            (TestValue::Bool(a), TestValue::Bool(b)) => a == b,
            (TestValue::Int(a), TestValue::Int(b)) => a == b,
            (TestValue::Float(a), TestValue::Float(b)) => (a - b).abs() <= tolerance,
            (TestValue::Vec3(ax, ay, az), TestValue::Vec3(bx, by, bz)) => {
                let (dx, dy, dz) = (ax - bx, ay - by, az - bz);
                dx * dx + dy * dy + dz * dz <= tolerance * tolerance
            }
            _ => false,
        }
    }

    fn deep_copy(&self) -> Self {
        self.clone()
    }

    fn encode(&self, writer: &mut dyn BitWrite) {
        match self {
            TestValue::Bool(value) => {
                writer.write_byte(0);
                writer.write_bit(*value);
            }
            TestValue::Int(value) => {
                writer.write_byte(1);
                for byte in value.to_le_bytes() {
                    writer.write_byte(byte);
                }
            }
            TestValue::Float(value) => {
                writer.write_byte(2);
                for byte in value.to_le_bytes() {
                    writer.write_byte(byte);
                }
            }
            TestValue::Vec3(x, y, z) => {
                writer.write_byte(3);
                for component in [x, y, z] {
                    for byte in component.to_le_bytes() {
                        writer.write_byte(byte);
                    }
                }
            }
        }
    }

    fn decode(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let tag = reader.read_byte()?;
        match tag {
            0 => Ok(TestValue::Bool(reader.read_bit()?)),
            1 => {
                let mut bytes = [0u8; 8];
                for byte in bytes.iter_mut() {
                    *byte = reader.read_byte()?;
                }
                Ok(TestValue::Int(i64::from_le_bytes(bytes)))
            }
            2 => Ok(TestValue::Float(read_f32(reader)?)),
            3 => Ok(TestValue::Vec3(
                read_f32(reader)?,
                read_f32(reader)?,
                read_f32(reader)?,
            )),
            _ => Err(SerdeErr::InvalidEncoding),
        }
    }
}

fn read_f32(reader: &mut BitReader) -> Result<f32, SerdeErr> {
    let mut bytes = [0u8; 4];
    for byte in bytes.iter_mut() {
        *byte = reader.read_byte()?;
    }
    Ok(f32::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsync::BitWriter;

    #[test]
    fn round_trips() {
        for value in [
            TestValue::Bool(true),
            TestValue::Int(-42),
            TestValue::Float(3.5),
            TestValue::Vec3(1.0, -2.0, 0.5),
        ] {
            let mut writer = BitWriter::new();
            value.encode(&mut writer);
            let bytes = writer.to_bytes();

            let decoded = TestValue::decode(&mut BitReader::new(&bytes)).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn approximate_equality() {
        let tolerance = 0.001;
        assert!(TestValue::Float(1.0).equal_approx(&TestValue::Float(1.0005), tolerance));
        assert!(!TestValue::Float(1.0).equal_approx(&TestValue::Float(1.01), tolerance));
        assert!(TestValue::Vec3(0.0, 0.0, 0.0)
            .equal_approx(&TestValue::Vec3(0.0005, 0.0, 0.0), tolerance));
        assert!(!TestValue::Vec3(0.0, 0.0, 0.0)
            .equal_approx(&TestValue::Vec3(0.0, 0.1, 0.0), tolerance));
        // mismatched kinds are never equal
        assert!(!TestValue::Float(1.0).equal_approx(&TestValue::Int(1), tolerance));
    }
}
