use super::Rect;
use crate::common::*;

/// Bounding box in TLBR format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TLBR<T> {
    pub(crate) t: T,
    pub(crate) l: T,
    pub(crate) b: T,
    pub(crate) r: T,
}

impl<T> Rect for TLBR<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn t(&self) -> Self::Type {
        self.t
    }

    fn l(&self) -> Self::Type {
        self.l
    }

    fn b(&self) -> Self::Type {
        self.b
    }

    fn r(&self) -> Self::Type {
        self.r
    }

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self> {
        let [t, l, b, r] = tlbr;
        ensure!(b >= t && r >= l, "b >= t and r >= l must hold");

        Ok(Self { t, l, b, r })
    }

    fn try_from_tlhw(tlhw: [Self::Type; 4]) -> Result<Self> {
        let [t, l, h, w] = tlhw;
        let zero = T::zero();
        ensure!(h >= zero && w >= zero, "h and w must be non-negative");

        let b = t + h;
        let r = l + w;
        Self::try_from_tlbr([t, l, b, r])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noisy_float::prelude::*;

    #[test]
    fn xywh_to_corners() -> Result<()> {
        let rect = TLBR::try_from_xywh([r64(10.0), r64(20.0), r64(5.0), r64(8.0)])?;
        assert_eq!(rect.xyxy(), [r64(10.0), r64(20.0), r64(15.0), r64(28.0)]);
        Ok(())
    }

    #[test]
    fn height_is_independent_of_width() -> Result<()> {
        // ymax comes from the height
        let rect = TLBR::try_from_xywh([0i64, 0, 3, 7])?;
        assert_eq!(rect.xyxy(), [0, 0, 3, 7]);
        Ok(())
    }

    #[test]
    fn tlhw_and_tlbr_agree() -> Result<()> {
        let lhs = TLBR::try_from_tlhw([2i32, 1, 4, 3])?;
        let rhs = TLBR::try_from_tlbr([2i32, 1, 6, 4])?;
        assert_eq!(lhs, rhs);
        Ok(())
    }

    #[test]
    fn reject_negative_size() {
        assert!(TLBR::try_from_xywh([r64(0.0), r64(0.0), r64(-1.0), r64(2.0)]).is_err());
        assert!(TLBR::try_from_tlbr([5, 0, 4, 1]).is_err());
    }
}
