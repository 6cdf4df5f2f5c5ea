//! Cameras.

/// Camera projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraProjection {
    Perspective {
        /// Vertical field of view in degrees.
        yfov_degrees: f32,
        aspect: Option<f32>,
        znear: f32,
        zfar: Option<f32>,
    },
    Orthographic {
        /// Half the horizontal view extent.
        xmag: f32,
        /// Half the vertical view extent.
        ymag: f32,
        znear: f32,
        zfar: f32,
    },
}

/// A camera attached to a node.
#[derive(Debug, Clone)]
pub struct Camera {
    pub name: String,
    pub projection: CameraProjection,
}

impl Camera {
    #[must_use]
    pub fn perspective(name: impl Into<String>, yfov_degrees: f32, znear: f32, zfar: f32) -> Self {
        Self {
            name: name.into(),
            projection: CameraProjection::Perspective {
                yfov_degrees,
                aspect: None,
                znear,
                zfar: Some(zfar),
            },
        }
    }

    /// The glTF camera type string.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self.projection {
            CameraProjection::Perspective { .. } => "perspective",
            CameraProjection::Orthographic { .. } => "orthographic",
        }
    }
}
