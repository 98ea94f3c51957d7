//! FDEF and IDEF tables.

use core::ops::Range;

use super::{code::Program, error::HintErrorKind};

/// Body of a function (FDEF) or user instruction (IDEF).
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Definition {
    start: u32,
    end: u32,
    key: i32,
    program: Program,
    is_active: bool,
}

impl Definition {
    /// `key` is the function number for FDEF and the opcode for IDEF.
    pub fn new(program: Program, code_range: Range<usize>, key: i32) -> Self {
        Self {
            // programs longer than MAX_PROGRAM_LEN never run
            start: code_range.start as u32,
            end: code_range.end as u32,
            key,
            program,
            is_active: true,
        }
    }

    pub fn program(&self) -> Program {
        self.program
    }

    /// Bytes of the body, excluding the FDEF/IDEF and ENDF opcodes.
    pub fn code_range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    pub fn key(&self) -> i32 {
        self.key
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    fn holds(&self, key: i32) -> bool {
        self.is_active && self.key == key
    }
}

/// Fixed capacity table of definitions, sized from `maxp`.
///
/// Glyph programs get the `Ref` variant and cannot define anything.
pub enum DefinitionMap<'a> {
    Ref(&'a [Definition]),
    Mut(&'a mut [Definition]),
}

impl DefinitionMap<'_> {
    fn entries(&self) -> &[Definition] {
        match self {
            Self::Ref(defs) => defs,
            Self::Mut(defs) => defs,
        }
    }

    /// Returns a fresh entry for `key`, replacing any existing definition.
    ///
    /// A key is stored at its own index when that slot is free or already
    /// holds it. Other keys reuse their existing slot or take the highest
    /// free one.
    pub fn allocate(&mut self, key: i32) -> Result<&mut Definition, HintErrorKind> {
        let Self::Mut(defs) = self else {
            return Err(HintErrorKind::DefinitionInGlyphProgram);
        };
        let own_slot = usize::try_from(key)
            .ok()
            .filter(|&ix| defs.get(ix).is_some_and(|def| !def.is_active || def.key == key));
        let slot = own_slot
            .or_else(|| defs.iter().rposition(|def| def.holds(key)))
            .or_else(|| defs.iter().rposition(|def| !def.is_active))
            .ok_or(HintErrorKind::TooManyDefinitions)?;
        let def = &mut defs[slot];
        *def = Definition::new(Program::Font, 0..0, key);
        Ok(def)
    }

    pub fn get(&self, key: i32) -> Option<&Definition> {
        let defs = self.entries();
        usize::try_from(key)
            .ok()
            .and_then(|ix| defs.get(ix))
            .filter(|def| def.holds(key))
            .or_else(|| defs.iter().find(|def| def.holds(key)))
    }

    /// Marks every entry as undefined.
    pub fn reset(&mut self) {
        if let Self::Mut(defs) = self {
            defs.fill(Definition::default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_by_key() {
        let mut storage = [Definition::default(); 4];
        let mut map = DefinitionMap::Mut(&mut storage);
        for key in 0..4 {
            *map.allocate(key).unwrap() = Definition::new(Program::Font, 0..key as usize, key);
        }
        assert_eq!(map.get(2).unwrap().code_range(), 0..2);
        assert_eq!(map.allocate(4), Err(HintErrorKind::TooManyDefinitions));
        // redefining replaces the old entry
        *map.allocate(1).unwrap() = Definition::new(Program::ControlValue, 5..9, 1);
        assert_eq!(map.get(1).unwrap().program(), Program::ControlValue);
    }

    #[test]
    fn allocate_sparse_keys() {
        let mut storage = [Definition::default(); 3];
        let mut map = DefinitionMap::Mut(&mut storage);
        *map.allocate(0xB0).unwrap() = Definition::new(Program::Font, 1..2, 0xB0);
        *map.allocate(0x91).unwrap() = Definition::new(Program::Font, 3..4, 0x91);
        assert_eq!(map.get(0xB0).unwrap().code_range(), 1..2);
        assert_eq!(map.get(0x91).unwrap().code_range(), 3..4);
        assert!(map.get(0x92).is_none());
        assert!(map.get(-1).is_none());
    }

    #[test]
    fn glyph_programs_cannot_define() {
        let storage = [Definition::default(); 2];
        let mut map = DefinitionMap::Ref(&storage);
        assert_eq!(
            map.allocate(0),
            Err(HintErrorKind::DefinitionInGlyphProgram)
        );
    }
}
