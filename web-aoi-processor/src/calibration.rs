//! Scene camera calibration record
//!
//! The recording device stores its calibration as a fixed-layout
//! little-endian binary record:
//!
//! | field | type |
//! |---|---|
//! | version | `u8` |
//! | serial | `[u8; 6]` |
//! | scene, right eye, left eye camera | 3 x (`[[f64;3];3]` matrix, `[f64;8]` distortion, `[[f64;4];4]` extrinsics) |
//! | checksum | `u32` |
//!
//! The record is only consumed by the external surface tracker; the
//! processor validates its shape and hands it over.

use crate::types::{Result, WebAoiError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};
use std::path::Path;

const CAMERA_RECORD_SIZE: usize = (9 + 8 + 16) * 8;

/// Size in bytes of a calibration record
pub const CALIBRATION_RECORD_SIZE: usize = 1 + 6 + 3 * CAMERA_RECORD_SIZE + 4;

/// Intrinsics, distortion and pose of one camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraCalibration {
    pub camera_matrix: [[f64; 3]; 3],
    pub distortion_coefficients: [f64; 8],
    pub extrinsics_affine_matrix: [[f64; 4]; 4],
}

impl CameraCalibration {
    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut camera_matrix = [[0.0; 3]; 3];
        for row in camera_matrix.iter_mut() {
            reader.read_f64_into::<LittleEndian>(row)?;
        }

        let mut distortion_coefficients = [0.0; 8];
        reader.read_f64_into::<LittleEndian>(&mut distortion_coefficients)?;

        let mut extrinsics_affine_matrix = [[0.0; 4]; 4];
        for row in extrinsics_affine_matrix.iter_mut() {
            reader.read_f64_into::<LittleEndian>(row)?;
        }

        Ok(Self {
            camera_matrix,
            distortion_coefficients,
            extrinsics_affine_matrix,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let values = self
            .camera_matrix
            .iter()
            .flatten()
            .chain(self.distortion_coefficients.iter())
            .chain(self.extrinsics_affine_matrix.iter().flatten());
        for value in values {
            writer.write_f64::<LittleEndian>(*value)?;
        }
        Ok(())
    }
}

/// Device calibration for the scene and both eye cameras
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub version: u8,
    pub serial: [u8; 6],
    pub scene: CameraCalibration,
    pub right_eye: CameraCalibration,
    pub left_eye: CameraCalibration,
    pub checksum: u32,
}

impl Calibration {
    /// Load a calibration record from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        log::info!("Loading calibration: {:?}", path);

        if !path.exists() {
            return Err(WebAoiError::CalibrationError(format!(
                "Calibration file not found: {:?}",
                path
            )));
        }

        let bytes = std::fs::read(path).map_err(|e| {
            WebAoiError::CalibrationError(format!("Failed to read {:?}: {}", path, e))
        })?;

        let calibration = Self::from_bytes(&bytes)?;
        log::info!(
            "Calibration loaded: version {}, serial {}",
            calibration.version,
            calibration.serial_string()
        );
        Ok(calibration)
    }

    /// Parse a calibration record
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != CALIBRATION_RECORD_SIZE {
            return Err(WebAoiError::CalibrationError(format!(
                "Expected {} bytes, got {}",
                CALIBRATION_RECORD_SIZE,
                bytes.len()
            )));
        }

        let mut cursor = Cursor::new(bytes);
        Self::read_record(&mut cursor)
            .map_err(|e| WebAoiError::CalibrationError(format!("Truncated record: {}", e)))
    }

    fn read_record(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        let version = cursor.read_u8()?;
        let mut serial = [0u8; 6];
        cursor.read_exact(&mut serial)?;

        let scene = CameraCalibration::read_from(cursor)?;
        let right_eye = CameraCalibration::read_from(cursor)?;
        let left_eye = CameraCalibration::read_from(cursor)?;
        let checksum = cursor.read_u32::<LittleEndian>()?;

        Ok(Self {
            version,
            serial,
            scene,
            right_eye,
            left_eye,
            checksum,
        })
    }

    /// Encode the record in its on-disk layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(CALIBRATION_RECORD_SIZE);
        // Writes into a Vec cannot fail
        let _ = self.write_record(&mut bytes);
        bytes
    }

    fn write_record<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u8(self.version)?;
        writer.write_all(&self.serial)?;
        self.scene.write_to(writer)?;
        self.right_eye.write_to(writer)?;
        self.left_eye.write_to(writer)?;
        writer.write_u32::<LittleEndian>(self.checksum)
    }

    /// Device serial as printable text
    pub fn serial_string(&self) -> String {
        String::from_utf8_lossy(&self.serial)
            .trim_end_matches('\0')
            .to_string()
    }
}
