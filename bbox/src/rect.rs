use crate::common::*;

/// The generic rectangle.
///
/// Coordinates follow image conventions: `t`/`b` grow downwards along y,
/// `l`/`r` grow rightwards along x.
pub trait Rect {
    type Type;

    fn t(&self) -> Self::Type;
    fn l(&self) -> Self::Type;
    fn b(&self) -> Self::Type;
    fn r(&self) -> Self::Type;

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;

    fn try_from_tlhw(tlhw: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;

    /// Build from the `[x, y, width, height]` layout used by annotation tools.
    fn try_from_xywh(xywh: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized,
    {
        let [x, y, w, h] = xywh;
        Self::try_from_tlhw([y, x, h, w])
    }

    /// The `[xmin, ymin, xmax, ymax]` corners.
    fn xyxy(&self) -> [Self::Type; 4] {
        [self.l(), self.t(), self.r(), self.b()]
    }
}
