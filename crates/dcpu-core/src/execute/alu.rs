//! Pure arithmetic, logic and predicate kernels for basic opcodes.

use crate::encoding::BasicOpcode;

/// Computes `op b, a`, returning the new `b` and, when the opcode writes it,
/// the new `EX`.
#[must_use]
pub fn compute(op: BasicOpcode, b: u16, a: u16, ex: u16) -> (u16, Option<u16>) {
    match op {
        BasicOpcode::Set | BasicOpcode::Sti | BasicOpcode::Std => (a, None),
        BasicOpcode::Add => {
            let sum = u32::from(b) + u32::from(a);
            (sum as u16, Some(u16::from(sum > 0xFFFF)))
        }
        BasicOpcode::Sub => {
            let (diff, borrow) = b.overflowing_sub(a);
            (diff, Some(if borrow { 0xFFFF } else { 0 }))
        }
        BasicOpcode::Mul => {
            let product = u32::from(b) * u32::from(a);
            (product as u16, Some((product >> 16) as u16))
        }
        BasicOpcode::Mli => {
            let product = i32::from(b as i16) * i32::from(a as i16);
            (product as u16, Some((product >> 16) as u16))
        }
        BasicOpcode::Div => {
            if a == 0 {
                return (0, Some(0));
            }
            let fraction = (u32::from(b) << 16) / u32::from(a);
            (b / a, Some(fraction as u16))
        }
        BasicOpcode::Dvi => {
            if a == 0 {
                return (0, Some(0));
            }
            let (num, den) = (i32::from(b as i16), i32::from(a as i16));
            let fraction = (num << 16).wrapping_div(den);
            ((num / den) as u16, Some(fraction as u16))
        }
        BasicOpcode::Mod => {
            if a == 0 {
                return (0, None);
            }
            (b % a, None)
        }
        BasicOpcode::Mdi => {
            if a == 0 {
                return (0, None);
            }
            ((b as i16).wrapping_rem(a as i16) as u16, None)
        }
        BasicOpcode::And => (b & a, None),
        BasicOpcode::Bor => (b | a, None),
        BasicOpcode::Xor => (b ^ a, None),
        BasicOpcode::Shr => {
            let shift = u32::from(a);
            let value = b.checked_shr(shift).unwrap_or(0);
            (value, Some(shifted_out_low(b, shift)))
        }
        BasicOpcode::Asr => {
            let shift = u32::from(a).min(31);
            let value = (i32::from(b as i16) >> shift) as u16;
            (value, Some(shifted_out_low(b, u32::from(a))))
        }
        BasicOpcode::Shl => {
            let wide = u64::from(b).checked_shl(u32::from(a)).unwrap_or(0);
            (wide as u16, Some((wide >> 16) as u16))
        }
        BasicOpcode::Adx => {
            let sum = u32::from(b) + u32::from(a) + u32::from(ex);
            (sum as u16, Some(u16::from(sum > 0xFFFF)))
        }
        BasicOpcode::Sbx => {
            let wide = i32::from(b) - i32::from(a) + i32::from(ex as i16);
            let carry = if wide < 0 {
                0xFFFF
            } else if wide > 0xFFFF {
                0x0001
            } else {
                0
            };
            (wide as u16, Some(carry))
        }
        BasicOpcode::Ifb
        | BasicOpcode::Ifc
        | BasicOpcode::Ife
        | BasicOpcode::Ifn
        | BasicOpcode::Ifg
        | BasicOpcode::Ifa
        | BasicOpcode::Ifl
        | BasicOpcode::Ifu => (b, None),
    }
}

/// `((b << 16) >>> shift) & 0xFFFF`: the bits shifted out of the right end.
fn shifted_out_low(b: u16, shift: u32) -> u16 {
    (u32::from(b) << 16).checked_shr(shift).unwrap_or(0) as u16
}

/// Evaluates an `IF*` predicate. Non-conditional opcodes always pass.
#[must_use]
pub fn condition(op: BasicOpcode, b: u16, a: u16) -> bool {
    match op {
        BasicOpcode::Ifb => (b & a) != 0,
        BasicOpcode::Ifc => (b & a) == 0,
        BasicOpcode::Ife => b == a,
        BasicOpcode::Ifn => b != a,
        BasicOpcode::Ifg => b > a,
        BasicOpcode::Ifa => (b as i16) > (a as i16),
        BasicOpcode::Ifl => b < a,
        BasicOpcode::Ifu => (b as i16) < (a as i16),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{compute, condition};
    use crate::encoding::BasicOpcode;

    #[rstest]
    #[case::add_plain(BasicOpcode::Add, 5, 3, 0, 8, Some(0))]
    #[case::add_overflow(BasicOpcode::Add, 0xFFFF, 2, 0, 1, Some(1))]
    #[case::sub_plain(BasicOpcode::Sub, 5, 3, 0, 2, Some(0))]
    #[case::sub_underflow(BasicOpcode::Sub, 0, 1, 0, 0xFFFF, Some(0xFFFF))]
    #[case::mul_high_word(BasicOpcode::Mul, 0x1000, 0x0100, 0, 0x0000, Some(0x0010))]
    #[case::mli_negative(BasicOpcode::Mli, 0xFFFF, 2, 0, 0xFFFE, Some(0xFFFF))]
    #[case::div_fraction(BasicOpcode::Div, 7, 2, 0, 3, Some(0x8000))]
    #[case::div_by_zero(BasicOpcode::Div, 7, 0, 0x1234, 0, Some(0))]
    #[case::dvi_rounds_toward_zero(BasicOpcode::Dvi, 0xFFF9, 2, 0, 0xFFFD, Some(0x8000))]
    #[case::dvi_min_by_minus_one(BasicOpcode::Dvi, 0x8000, 0xFFFF, 0, 0x8000, Some(0))]
    #[case::dvi_by_zero(BasicOpcode::Dvi, 0x8000, 0, 0, 0, Some(0))]
    #[case::mod_plain(BasicOpcode::Mod, 7, 3, 0, 1, None)]
    #[case::mod_by_zero(BasicOpcode::Mod, 7, 0, 0, 0, None)]
    #[case::mdi_keeps_sign_of_b(BasicOpcode::Mdi, 0xFFF9, 16, 0, 0xFFF9, None)]
    #[case::mdi_min_by_minus_one(BasicOpcode::Mdi, 0x8000, 0xFFFF, 0, 0, None)]
    #[case::and(BasicOpcode::And, 0b1100, 0b1010, 0, 0b1000, None)]
    #[case::bor(BasicOpcode::Bor, 0b1100, 0b1010, 0, 0b1110, None)]
    #[case::xor(BasicOpcode::Xor, 0b1100, 0b1010, 0, 0b0110, None)]
    #[case::shr(BasicOpcode::Shr, 0x8001, 1, 0, 0x4000, Some(0x8000))]
    #[case::shr_wide(BasicOpcode::Shr, 0xFFFF, 40, 0, 0, Some(0))]
    #[case::asr(BasicOpcode::Asr, 0x8001, 1, 0, 0xC000, Some(0x8000))]
    #[case::asr_wide(BasicOpcode::Asr, 0x8000, 100, 0, 0xFFFF, Some(0))]
    #[case::shl(BasicOpcode::Shl, 0x8001, 1, 0, 0x0002, Some(0x0001))]
    #[case::shl_wide(BasicOpcode::Shl, 0xFFFF, 80, 0, 0, Some(0))]
    #[case::adx_with_carry(BasicOpcode::Adx, 0xFFFF, 0, 1, 0, Some(1))]
    #[case::adx_plain(BasicOpcode::Adx, 1, 2, 1, 4, Some(0))]
    #[case::sbx_borrow_in(BasicOpcode::Sbx, 0, 0, 0xFFFF, 0xFFFF, Some(0xFFFF))]
    #[case::sbx_plain(BasicOpcode::Sbx, 5, 3, 0, 2, Some(0))]
    #[case::set(BasicOpcode::Set, 1, 2, 3, 2, None)]
    fn kernel_results(
        #[case] op: BasicOpcode,
        #[case] b: u16,
        #[case] a: u16,
        #[case] ex: u16,
        #[case] expected: u16,
        #[case] expected_ex: Option<u16>,
    ) {
        assert_eq!(compute(op, b, a, ex), (expected, expected_ex));
    }

    #[rstest]
    #[case(BasicOpcode::Ifb, 0b0110, 0b0100, true)]
    #[case(BasicOpcode::Ifb, 0b0110, 0b1000, false)]
    #[case(BasicOpcode::Ifc, 0b0110, 0b1000, true)]
    #[case(BasicOpcode::Ife, 4, 4, true)]
    #[case(BasicOpcode::Ifn, 4, 4, false)]
    #[case(BasicOpcode::Ifg, 5, 4, true)]
    #[case(BasicOpcode::Ifg, 0xFFFF, 1, true)]
    #[case(BasicOpcode::Ifa, 0xFFFF, 1, false)]
    #[case(BasicOpcode::Ifl, 1, 0xFFFF, true)]
    #[case(BasicOpcode::Ifu, 0xFFFF, 1, true)]
    #[case(BasicOpcode::Set, 0, 0, true)]
    fn predicates(#[case] op: BasicOpcode, #[case] b: u16, #[case] a: u16, #[case] taken: bool) {
        assert_eq!(condition(op, b, a), taken);
    }
}
