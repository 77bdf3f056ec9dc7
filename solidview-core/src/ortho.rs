/// The four fixed orthographic views and a per-view container
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VizError;
use crate::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrthoView {
    Top,
    Front,
    Right,
    Left,
}

impl OrthoView {
    pub const ALL: [OrthoView; 4] = [
        OrthoView::Top,
        OrthoView::Front,
        OrthoView::Right,
        OrthoView::Left,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OrthoView::Top => "top",
            OrthoView::Front => "front",
            OrthoView::Right => "right",
            OrthoView::Left => "left",
        }
    }

    /// Rotation that turns this view's face of a shape toward a camera on
    /// the +Z axis.
    ///
    /// Top tips the shape a quarter turn about X so its upper face (and a
    /// cylinder's circular cap) looks at the camera; right and left turn it
    /// a quarter turn about the vertical axis.
    pub fn orientation(self) -> UnitQuaternion<f32> {
        match self {
            OrthoView::Top => Transform::quarter_turn(Vector3::x()),
            OrthoView::Front => UnitQuaternion::identity(),
            OrthoView::Right => Transform::quarter_turn(-Vector3::y()),
            OrthoView::Left => Transform::quarter_turn(Vector3::y()),
        }
    }
}

impl fmt::Display for OrthoView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrthoView {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrthoView::ALL
            .into_iter()
            .find(|view| view.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| VizError::UnknownView(s.to_string()))
    }
}

/// One value per orthographic view, each owned independently
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrthoSet<T> {
    pub top: T,
    pub front: T,
    pub right: T,
    pub left: T,
}

impl<T> OrthoSet<T> {
    pub fn from_fn(mut f: impl FnMut(OrthoView) -> T) -> Self {
        Self {
            top: f(OrthoView::Top),
            front: f(OrthoView::Front),
            right: f(OrthoView::Right),
            left: f(OrthoView::Left),
        }
    }

    pub fn get(&self, view: OrthoView) -> &T {
        match view {
            OrthoView::Top => &self.top,
            OrthoView::Front => &self.front,
            OrthoView::Right => &self.right,
            OrthoView::Left => &self.left,
        }
    }

    pub fn get_mut(&mut self, view: OrthoView) -> &mut T {
        match view {
            OrthoView::Top => &mut self.top,
            OrthoView::Front => &mut self.front,
            OrthoView::Right => &mut self.right,
            OrthoView::Left => &mut self.left,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (OrthoView, &T)> {
        OrthoView::ALL.into_iter().map(move |view| (view, self.get(view)))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        [
            &mut self.top,
            &mut self.front,
            &mut self.right,
            &mut self.left,
        ]
        .into_iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (OrthoView, &mut T)> {
        OrthoView::ALL.into_iter().zip(self.values_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faces_camera(view: OrthoView, face_normal: Vector3<f32>) -> bool {
        (view.orientation() * face_normal - Vector3::z()).norm() < 1e-6
    }

    #[test]
    fn test_each_view_turns_its_face_to_the_camera() {
        assert!(faces_camera(OrthoView::Top, Vector3::y()));
        assert!(faces_camera(OrthoView::Front, Vector3::z()));
        assert!(faces_camera(OrthoView::Right, Vector3::x()));
        assert!(faces_camera(OrthoView::Left, -Vector3::x()));
    }

    #[test]
    fn test_set_access_by_view() {
        let mut set = OrthoSet::from_fn(|view| view.label().len());
        assert_eq!(*set.get(OrthoView::Front), 5);
        *set.get_mut(OrthoView::Left) = 0;
        assert_eq!(set.left, 0);
        assert_eq!(set.iter().count(), 4);
    }

    #[test]
    fn test_view_from_str() {
        assert_eq!("TOP".parse::<OrthoView>().unwrap(), OrthoView::Top);
        assert!("bottom".parse::<OrthoView>().is_err());
    }
}
