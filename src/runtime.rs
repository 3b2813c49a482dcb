use crate::{
    alu::Alu, error::RunError, isa::Instr, output::Dump, program::Program, symbol::Register,
    terminal::Console,
};

/// Bytes of addressable RAM.
pub const RAM_SIZE: usize = 256;

/// What the machine does after a step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    Continue,
    Halt,
}

/// Complete machine state for a single run.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Machine {
    /// General purpose registers
    reg: [u8; Register::COUNT],
    /// Memory-mapped I/O registers, written by `OUT`
    io: [u8; Register::COUNT],
    ram: [u8; RAM_SIZE],
    pc: u8,
    alu: Alu,
}

impl Default for Machine {
    fn default() -> Self {
        Machine {
            reg: [0; Register::COUNT],
            io: [0; Register::COUNT],
            ram: [0; RAM_SIZE],
            pc: 0,
            alu: Alu::new(),
        }
    }
}

/// Execute `program` on a fresh machine until it halts.
///
/// A final state dump is logged to the console on halt.
pub fn run<C>(program: &Program, console: &mut C) -> Result<Machine, RunError>
where
    C: Console + ?Sized,
{
    let mut machine = Machine::new();
    machine.run(program, console)?;
    Ok(machine)
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pc(&self) -> u8 {
        self.pc
    }

    pub fn carry(&self) -> bool {
        self.alu.carry()
    }

    pub fn reg(&self, reg: Register) -> u8 {
        self.reg[reg.index()]
    }

    pub fn registers(&self) -> &[u8; Register::COUNT] {
        &self.reg
    }

    pub fn io(&self) -> &[u8; Register::COUNT] {
        &self.io
    }

    pub fn ram(&self) -> &[u8; RAM_SIZE] {
        &self.ram
    }

    #[inline]
    fn set(&mut self, reg: Register, value: u8) {
        self.reg[reg.index()] = value;
    }

    /// Run until halt, starting from the current state.
    pub fn run<C>(&mut self, program: &Program, console: &mut C) -> Result<(), RunError>
    where
        C: Console + ?Sized,
    {
        while self.step(program, console)? == Flow::Continue {}
        console.clear();
        console.log(&Dump::new(self, console.is_minimal()).to_string());
        Ok(())
    }

    /// Fetch, decode and execute the record at the program counter.
    pub fn step<C>(&mut self, program: &Program, console: &mut C) -> Result<Flow, RunError>
    where
        C: Console + ?Sized,
    {
        let pc = self.pc;
        let Some(record) = program.get(pc as usize) else {
            return Err(RunError::PcOutOfRange {
                pc,
                len: program.len(),
            });
        };
        let instr = record.decode().map_err(|error| RunError::Decode {
            pc,
            line: program.line(pc as usize),
            error,
        })?;

        let mut next = pc.wrapping_add(1);
        match instr {
            Instr::Add { a, b, c } => self.arith(Alu::add, a, b, c),
            Instr::Addc { a, b, c } => self.arith(Alu::addc, a, b, c),
            Instr::Sub { a, b, c } => self.arith(Alu::sub, a, b, c),
            Instr::Swb { a, b, c } => self.arith(Alu::swb, a, b, c),
            Instr::Nand { a, b, c } => self.arith(|alu, x, y| alu.nand(x, y), a, b, c),
            Instr::Rsft { a, c } => self.set(c, self.reg(a) >> 1),
            Instr::Imm { imm, c } => self.set(c, imm),
            Instr::Ld { a, c } => self.set(c, self.ram[self.reg(a) as usize]),
            Instr::Ldim { addr, c } => self.set(c, self.ram[addr as usize]),
            Instr::St { a, b } => self.ram[self.reg(a) as usize] = self.reg(b),
            Instr::Stim { addr, c } => self.ram[addr as usize] = self.reg(c),
            Instr::Beq { target, c } => {
                if self.reg(Register::R15) == self.reg(c) {
                    next = target;
                }
            }
            Instr::Bgt { target, c } => {
                if self.reg(Register::R15) > self.reg(c) {
                    next = target;
                }
            }
            Instr::Jmpl { target, link } => {
                self.set(link, pc.wrapping_add(1));
                next = target;
            }
            Instr::Halt => return Ok(Flow::Halt),
            Instr::In { device, c } => {
                let value = self.read_input(device, console)?;
                self.set(c, value);
            }
            Instr::Out { port, b } => self.io[port.index()] = self.reg(b),
        }
        self.pc = next;
        Ok(Flow::Continue)
    }

    #[inline]
    fn arith(&mut self, op: fn(&mut Alu, u8, u8) -> u8, a: Register, b: Register, c: Register) {
        let (lhs, rhs) = (self.reg(a), self.reg(b));
        let result = op(&mut self.alu, lhs, rhs);
        self.set(c, result);
    }

    /// Show the machine state, then block for a value from the console.
    fn read_input<C>(&self, device: Register, console: &mut C) -> Result<u8, RunError>
    where
        C: Console + ?Sized,
    {
        console.clear();
        console.log(&Dump::new(self, console.is_minimal()).to_string());
        let input = console.get_input(&format!(
            "Program reading io register: {}, enter value 0-255: ",
            device.get()
        ))?;
        input.trim().parse().map_err(|_| RunError::BadInput {
            device: device.get(),
            input,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, io};

    use super::*;
    use crate::{
        assembler::assemble,
        isa::{DecodeError, Record},
    };

    /// Console which records everything and answers prompts from a queue.
    #[derive(Default)]
    struct Recorder {
        clears: usize,
        logs: Vec<String>,
        prompts: Vec<String>,
        inputs: VecDeque<String>,
    }

    impl Recorder {
        fn with_inputs(inputs: &[&str]) -> Self {
            Recorder {
                inputs: inputs.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    impl Console for Recorder {
        fn clear(&mut self) {
            self.clears += 1;
        }

        fn log(&mut self, text: &str) {
            self.logs.push(text.to_owned());
        }

        fn get_input(&mut self, prompt: &str) -> io::Result<String> {
            self.prompts.push(prompt.to_owned());
            self.inputs
                .pop_front()
                .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
        }

        fn is_minimal(&self) -> bool {
            true
        }
    }

    fn r(index: u8) -> Register {
        Register::new(index).unwrap()
    }

    fn run_src(src: &str) -> Machine {
        run(&assemble(src).unwrap(), &mut Recorder::default()).unwrap()
    }

    #[test]
    fn adds_two_immediates() {
        let program = Program::from(vec![
            Record::new([6, 5, 0, 0]),
            Record::new([6, 3, 1, 0]),
            Record::new([0, 0, 1, 2]),
            Record::new([13, 0, 0, 0]),
        ]);
        let mut console = Recorder::default();
        let machine = run(&program, &mut console).unwrap();
        assert_eq!(machine.reg(r(2)), 8);
        assert_eq!(machine.pc(), 3);
        assert!(!machine.carry());
        assert_eq!(console.logs.len(), 1);
        assert!(console.logs[0].contains("R2 8"));
        assert!(console.prompts.is_empty());
    }

    #[test]
    fn step_reports_halt() {
        let program = assemble("IMM r1 1\nEXIT").unwrap();
        let mut machine = Machine::new();
        let mut console = Recorder::default();
        assert_eq!(
            machine.step(&program, &mut console).unwrap(),
            Flow::Continue
        );
        assert_eq!(machine.pc(), 1);
        assert_eq!(machine.step(&program, &mut console).unwrap(), Flow::Halt);
        assert_eq!(machine.pc(), 1);
        assert!(console.logs.is_empty());
    }

    #[test]
    fn halt_touches_nothing() {
        let machine = run(&Program::from(vec![Record::HALT]), &mut Recorder::default()).unwrap();
        assert_eq!(machine, Machine::new());
    }

    #[test]
    fn branch_taken_skips_increment() {
        let src = |value| format!("IMM r15 4\nIMM r1 {value}\nBEQ 4 r1\nIMM r2 9\nEXIT");
        assert_eq!(run_src(&src(4)).reg(r(2)), 0);
        assert_eq!(run_src(&src(3)).reg(r(2)), 9);

        let src = |value| format!("IMM r15 5\nIMM r1 {value}\nBGT 4 r1\nIMM r2 9\nEXIT");
        assert_eq!(run_src(&src(3)).reg(r(2)), 0);
        assert_eq!(run_src(&src(5)).reg(r(2)), 9);
        assert_eq!(run_src(&src(6)).reg(r(2)), 9);
    }

    #[test]
    fn jump_pseudo_always_taken() {
        let machine = run_src("IMM r15 200\nJMP 3\nIMM r1 1\nEXIT");
        assert_eq!(machine.reg(r(1)), 0);
    }

    #[test]
    fn jmpl_links_before_jumping() {
        let machine = run_src("JMPL r5 r3\nIMM r1 1\nEXIT\nIMM r2 2\nEXIT");
        assert_eq!(machine.reg(r(5)), 1);
        assert_eq!(machine.reg(r(1)), 0);
        assert_eq!(machine.reg(r(2)), 2);
        assert_eq!(machine.pc(), 4);
    }

    #[test]
    fn loops_with_labels() {
        // Count r1 down from 5, adding 3 to r2 each time
        let src = "\
            IMM r1 5\n\
            IMM r3 3\n\
            IMM r4 1\n\
            IMM r15 0\n\
            loop: ADD r2 r2 r3\n\
            SUB r1 r1 r4\n\
            BEQ done: r1\n\
            JMP loop:\n\
            done: EXIT\n";
        let machine = run_src(src);
        assert_eq!(machine.reg(r(2)), 15);
        assert_eq!(machine.reg(r(1)), 0);
    }

    #[test]
    fn arithmetic_sets_carry() {
        let machine = run_src("IMM r1 250\nIMM r2 10\nADD r3 r1 r2\nNAND r4 r1 r2\nEXIT");
        assert_eq!(machine.reg(r(3)), 4);
        assert_eq!(machine.reg(r(4)), !(250u8 & 10));
        assert!(machine.carry());

        let machine = run_src("IMM r1 5\nIMM r2 10\nSUB r3 r1 r2\nSWB r4 r2 r1\nEXIT");
        assert_eq!(machine.reg(r(3)), 251);
        assert_eq!(machine.reg(r(4)), 4);
        assert!(!machine.carry());

        let machine = run_src("IMM r1 255\nIMM r2 1\nADD r3 r1 r2\nADDC r4 r0 r0\nEXIT");
        assert_eq!(machine.reg(r(3)), 0);
        assert_eq!(machine.reg(r(4)), 1);
    }

    #[test]
    fn shift_and_move() {
        let machine = run_src("IMM r1 9\nRSFT r2 r1\nMOV r7 r1\nEXIT");
        assert_eq!(machine.reg(r(2)), 4);
        assert_eq!(machine.reg(r(7)), 9);
    }

    #[test]
    fn loads_and_stores() {
        let src = "\
            IMM r1 7\n\
            IMM r2 99\n\
            ST r1 r2\n\
            LDIM r3 7\n\
            STIM 200 r2\n\
            IMM r4 200\n\
            LD r5 r4\n\
            EXIT";
        let machine = run_src(src);
        assert_eq!(machine.ram()[7], 99);
        assert_eq!(machine.ram()[200], 99);
        assert_eq!(machine.reg(r(3)), 99);
        assert_eq!(machine.reg(r(5)), 99);
    }

    #[test]
    fn out_writes_io_register() {
        let machine = run_src("IMM r1 77\nOUT r4 r1\nEXIT");
        assert_eq!(machine.io()[4], 77);
        assert_eq!(machine.reg(r(4)), 0);
    }

    #[test]
    fn in_reads_console() {
        let program = assemble("IN r3 r2\nEXIT").unwrap();
        let mut console = Recorder::with_inputs(&[" 42\n"]);
        let machine = run(&program, &mut console).unwrap();
        assert_eq!(machine.reg(r(3)), 42);
        assert_eq!(
            console.prompts,
            vec!["Program reading io register: 2, enter value 0-255: "]
        );
        // One dump before the prompt, one on halt
        assert_eq!(console.logs.len(), 2);
        assert_eq!(console.clears, 2);
    }

    #[test]
    fn in_rejects_bad_values() {
        let program = assemble("IN r3 r2\nEXIT").unwrap();
        for input in ["256", "-1", "abc", ""] {
            let err = run(&program, &mut Recorder::with_inputs(&[input])).unwrap_err();
            match err {
                RunError::BadInput { device, input: got } => {
                    assert_eq!(device, 2);
                    assert_eq!(got, input);
                }
                other => panic!("unexpected error {other:?}"),
            }
        }

        let err = run(&program, &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, RunError::Console(_)));
    }

    #[test]
    fn bad_opcode_is_fatal() {
        let program = Program::from(vec![Record::NOP, Record::new([16, 0, 0, 0])]);
        let err = run(&program, &mut Recorder::default()).unwrap_err();
        assert!(matches!(
            err,
            RunError::Decode {
                pc: 1,
                line: None,
                error: DecodeError::Opcode(16)
            }
        ));
    }

    #[test]
    fn bad_register_cites_line() {
        let mut program = Program::new();
        program.push(Record::new([0, 1, 2, 30]), 4);
        let err = run(&program, &mut Recorder::default()).unwrap_err();
        assert!(matches!(
            err,
            RunError::Decode {
                pc: 0,
                line: Some(4),
                error: DecodeError::Register { slot: 3, value: 30 }
            }
        ));
        assert!(err.to_string().contains("(line 5)"));
    }

    #[test]
    fn running_off_the_end_is_fatal() {
        let err = run(&assemble("IMM r1 1").unwrap(), &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, RunError::PcOutOfRange { pc: 1, len: 1 }));

        let err = run(&assemble("JMP 9\nEXIT").unwrap(), &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, RunError::PcOutOfRange { pc: 9, len: 2 }));
    }
}
