use serde_derive::{Deserialize, Serialize};
use std::marker::PhantomData;

pub trait BBoxFormat: std::fmt::Debug + Copy + PartialEq {}

/// Left-top-width-height format, contains left top corner and width-height
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltwh;
impl BBoxFormat for Ltwh {}

/// Left-top-right-bottom format, contains left top and right bottom corners
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

/// Serialized as a plain `[f32; 4]` array in the order of its format.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(from = "[f32; 4]", into = "[f32; 4]", bound = "")]
pub struct BBox<F: BBoxFormat>([f32; 4], PhantomData<F>);

impl<F: BBoxFormat> From<BBox<F>> for [f32; 4] {
    fn from(bbox: BBox<F>) -> Self {
        bbox.0
    }
}

impl<F: BBoxFormat> From<[f32; 4]> for BBox<F> {
    fn from(slice: [f32; 4]) -> Self {
        BBox(slice, PhantomData)
    }
}

impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_slice(&self) -> &[f32; 4] {
        &self.0
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl BBox<Ltwh> {
    #[inline]
    pub fn ltwh(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox([x1, x2, x3, x4], PhantomData)
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.0[3]
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        BBox([x1, y1, x2, y2], PhantomData)
    }

    #[inline]
    pub fn as_ltwh(&self) -> BBox<Ltwh> {
        self.into()
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.0[3]
    }

    /// Area with inverted extents clamped to zero, so a degenerate box has no area.
    #[inline]
    pub fn area(&self) -> f32 {
        let ltwh = self.as_ltwh();

        ltwh.width().max(0.0) * ltwh.height().max(0.0)
    }

    /// Height over width, with the width floored to 1px.
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        let ltwh = self.as_ltwh();

        ltwh.height() / ltwh.width().max(1.0)
    }

    /// Intersection over union, 0 for boxes without area.
    pub fn iou(&self, other: &BBox<Ltrb>) -> f32 {
        let i_left = self.left().max(other.left());
        let i_right = self.right().min(other.right());
        let i_top = self.top().max(other.top());
        let i_bottom = self.bottom().min(other.bottom());
        let i_area = (i_right - i_left).max(0.0) * (i_bottom - i_top).max(0.0);

        let union = self.area() + other.area() - i_area;
        if union > 0.0 {
            i_area / union
        } else {
            0.0
        }
    }
}

impl<'a> From<&'a BBox<Ltwh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        Self(
            [v.0[0], v.0[1], v.0[2] + v.0[0], v.0[3] + v.0[1]],
            PhantomData,
        )
    }
}

impl<'a> From<&'a BBox<Ltrb>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        Self(
            [v.0[0], v.0[1], v.0[2] - v.0[0], v.0[3] - v.0[1]],
            PhantomData,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_of_inverted_box_is_zero() {
        assert_eq!(BBox::ltrb(10.0, 10.0, 5.0, 40.0).area(), 0.0);
        assert_eq!(BBox::ltrb(10.0, 10.0, 40.0, 10.0).area(), 0.0);
        assert_eq!(BBox::ltrb(0.0, 0.0, 30.0, 30.0).area(), 900.0);
    }

    #[test]
    fn aspect_ratio_floors_width() {
        let bbox = BBox::ltrb(10.0, 0.0, 10.5, 3.0);
        assert_eq!(bbox.aspect_ratio(), 3.0);

        let bbox = BBox::ltrb(0.0, 0.0, 20.0, 60.0);
        assert_eq!(bbox.aspect_ratio(), 3.0);
    }

    #[test]
    fn iou_of_overlapping_boxes() {
        let a = BBox::ltrb(0.0, 0.0, 10.0, 10.0);

        assert_eq!(a.iou(&a), 1.0);
        assert_eq!(a.iou(&BBox::ltrb(5.0, 0.0, 15.0, 10.0)), 50.0 / 150.0);
        assert_eq!(a.iou(&BBox::ltrb(20.0, 20.0, 30.0, 30.0)), 0.0);
        assert_eq!(a.iou(&BBox::ltrb(5.0, 5.0, 5.0, 5.0)), 0.0);
    }

    #[test]
    fn ltwh_conversion() {
        let ltrb = BBox::ltrb(4.0, 6.0, 14.0, 26.0);
        let ltwh = ltrb.as_ltwh();

        assert_eq!(ltwh.as_slice(), &[4.0, 6.0, 10.0, 20.0]);
        assert_eq!(ltwh.as_ltrb(), ltrb);
    }

    #[test]
    fn serializes_as_plain_array() {
        let bbox = BBox::ltrb(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_string(&bbox).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0]");

        let back: BBox<Ltrb> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bbox);
    }
}
