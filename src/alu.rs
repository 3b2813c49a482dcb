/// Arithmetic logic unit. Stateless apart from the carry flag.
///
/// Arithmetic is done on operands widened to 16 bits. Carry is set whenever the widened result
/// exceeds 255, which for subtraction means the result wrapped below zero.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Alu {
    carry: bool,
}

impl Alu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn carry(&self) -> bool {
        self.carry
    }

    #[inline]
    fn truncate(&mut self, result: u16) -> u8 {
        self.carry = result > 0xFF;
        result as u8
    }

    pub fn add(&mut self, a: u8, b: u8) -> u8 {
        self.truncate(u16::from(a) + u16::from(b))
    }

    pub fn addc(&mut self, a: u8, b: u8) -> u8 {
        self.truncate(u16::from(a) + u16::from(b) + u16::from(self.carry))
    }

    pub fn sub(&mut self, a: u8, b: u8) -> u8 {
        self.truncate(u16::from(a).wrapping_sub(u16::from(b)))
    }

    pub fn swb(&mut self, a: u8, b: u8) -> u8 {
        let result = u16::from(a)
            .wrapping_sub(u16::from(b))
            .wrapping_sub(u16::from(self.carry));
        self.truncate(result)
    }

    /// Carry is left untouched.
    pub fn nand(&self, a: u8, b: u8) -> u8 {
        !(a & b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sets_carry_on_overflow() {
        let mut alu = Alu::new();
        assert_eq!(alu.add(250, 10), 4);
        assert!(alu.carry());
        assert_eq!(alu.add(1, 1), 2);
        assert!(!alu.carry());
        assert_eq!(alu.add(255, 0), 255);
        assert!(!alu.carry());
    }

    #[test]
    fn addc_consumes_carry() {
        let mut alu = Alu::new();
        assert_eq!(alu.addc(1, 1), 2);
        alu.add(200, 100);
        assert_eq!(alu.addc(1, 1), 3);
        assert!(!alu.carry());
        alu.add(128, 128);
        assert_eq!(alu.addc(255, 0), 0);
        assert!(alu.carry());
    }

    #[test]
    fn sub_carries_on_wraparound() {
        let mut alu = Alu::new();
        assert_eq!(alu.sub(5, 10), 251);
        assert!(alu.carry());
        assert_eq!(alu.sub(10, 5), 5);
        assert!(!alu.carry());
        assert_eq!(alu.sub(7, 7), 0);
        assert!(!alu.carry());
    }

    #[test]
    fn swb_consumes_carry() {
        let mut alu = Alu::new();
        assert_eq!(alu.swb(9, 4), 5);
        assert!(!alu.carry());
        alu.sub(0, 1);
        assert_eq!(alu.swb(5, 5), 255);
        assert!(alu.carry());
        assert_eq!(alu.swb(10, 2), 7);
        assert!(!alu.carry());
    }

    #[test]
    fn nand_keeps_carry() {
        let mut alu = Alu::new();
        alu.add(250, 10);
        assert_eq!(alu.nand(0b1100, 0b1010), !0b1000u8);
        assert!(alu.carry());
        alu.add(0, 0);
        assert_eq!(alu.nand(0xFF, 0xFF), 0);
        assert!(!alu.carry());
    }
}
