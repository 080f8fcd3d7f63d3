//! houle-core — primitives partagées du bytecode runtime (no_std-ready)
//!
//! Fournit :
//! - `Location` : offset opaque dans un flux (réservation / patch)
//! - IO mémoire (little-endian) : `ByteWriter` (append-only + patch 4 octets),
//!   `ByteReader` (lecture séquentielle bornée)
//! - `BytecodeStream` : flux gelé, immuable après construction
//! - `ValueType` : types de valeurs du moteur (octets non nuls)
//! - Erreurs `CoreError` + alias `CoreResult<T>`
//!
//! Features :
//! - `std` (par défaut) : impl `std::error::Error` & tests
//! - `serde` : derive (dé)sérialisation sur les structures utiles
//!
//! Toute l'arithmétique multi-octets est little-endian. Les offsets sont des
//! `u32` : un flux ne dépasse jamais 4 GiB.

#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

/* ─────────────────────────── Imports ─────────────────────────── */

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec::Vec};

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Résultat commun ─────────────────────────── */

/// Alias résultat commun au core.
pub type CoreResult<T> = core::result::Result<T, CoreError>;

/* ─────────────────────────── Location ─────────────────────────── */

/// Offset opaque dans un flux de bytecode.
///
/// Produit par [`ByteWriter::position`] lors d'une réservation, consommé par
/// [`ByteWriter::patch_u32_le`]. Pas d'arithmétique publique : un `Location`
/// désigne un point du flux, pas un entier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location(u32);

impl Location {
    /// Début de flux.
    pub const ZERO: Self = Location(0);

    /// Construit un `Location` depuis un offset brut.
    pub const fn new(at: u32) -> Self { Location(at) }

    /// Offset brut.
    pub const fn get(self) -> u32 { self.0 }

    /// Offset brut en `usize` (indexation de slice).
    pub const fn as_usize(self) -> usize { self.0 as usize }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "@{}", self.0) }
}

/* ─────────────────────────── Types de valeurs ─────────────────────────── */

/// Type d'une valeur du moteur.
///
/// Les octets d'encodage sont tous non nuls : les listes de types du flux
/// sont terminées par `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum ValueType {
    /// Entier 32 bits.
    I32 = 0x7F,
    /// Entier 64 bits.
    I64 = 0x7E,
    /// Flottant 32 bits.
    F32 = 0x7D,
    /// Flottant 64 bits.
    F64 = 0x7C,
    /// Vecteur 128 bits.
    V128 = 0x7B,
    /// Référence de fonction.
    FuncRef = 0x70,
    /// Référence externe.
    ExternRef = 0x6F,
}

impl ValueType {
    /// Octet d'encodage (jamais nul).
    pub const fn to_byte(self) -> u8 { self as u8 }

    /// Décode un octet de type.
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x7F => Some(ValueType::I32),
            0x7E => Some(ValueType::I64),
            0x7D => Some(ValueType::F32),
            0x7C => Some(ValueType::F64),
            0x7B => Some(ValueType::V128),
            0x70 => Some(ValueType::FuncRef),
            0x6F => Some(ValueType::ExternRef),
            _ => None,
        }
    }

    /// Vrai pour les types référence.
    pub const fn is_reference(self) -> bool {
        matches!(self, ValueType::FuncRef | ValueType::ExternRef)
    }

    /// Vrai pour les types numériques (vecteur inclus).
    pub const fn is_numeric(self) -> bool { !self.is_reference() }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::V128 => "v128",
            ValueType::FuncRef => "funcref",
            ValueType::ExternRef => "externref",
        };
        f.write_str(s)
    }
}

/* ─────────────────────────── Byte Writer (LE) ─────────────────────────── */

/// Buffer d'écriture append-only (croît automatiquement).
///
/// Seule mutation non-append : [`ByteWriter::patch_u32_le`], qui réécrit
/// exactement 4 octets déjà émis sans changer la longueur du flux.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Crée un writer vide.
    pub fn new() -> Self { Self { buf: Vec::new() } }

    /// Crée un writer avec une capacité initiale.
    pub fn with_capacity(cap: usize) -> Self { Self { buf: Vec::with_capacity(cap) } }

    /// Longueur courante du flux.
    pub fn len(&self) -> usize { self.buf.len() }

    /// Vrai si rien n'a été émis.
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    /// Position courante (fin du flux).
    ///
    /// Panique si le flux atteint 4 GiB.
    pub fn position(&self) -> Location {
        assert!(self.buf.len() <= u32::MAX as usize, "bytecode stream exceeds u32 offsets");
        Location(self.buf.len() as u32)
    }

    /// Accès en lecture au contenu.
    pub fn as_slice(&self) -> &[u8] { &self.buf }

    /// Récupère le buffer (consomme).
    pub fn into_vec(self) -> Vec<u8> { self.buf }

    /// Gèle le flux.
    pub fn freeze(self) -> BytecodeStream { BytecodeStream::from_vec(self.buf) }

    /// Ajoute des octets bruts.
    pub fn write_bytes(&mut self, bytes: &[u8]) { self.buf.extend_from_slice(bytes); }

    /// Écrit un u8.
    pub fn write_u8(&mut self, v: u8) { self.buf.push(v); }

    /// Écrit un u16 little-endian.
    pub fn write_u16_le(&mut self, v: u16) { self.buf.extend_from_slice(&v.to_le_bytes()); }

    /// Écrit un u32 little-endian.
    pub fn write_u32_le(&mut self, v: u32) { self.buf.extend_from_slice(&v.to_le_bytes()); }

    /// Écrit un u64 little-endian.
    pub fn write_u64_le(&mut self, v: u64) { self.buf.extend_from_slice(&v.to_le_bytes()); }

    /// Écrit un u128 little-endian (immédiats vectoriels).
    pub fn write_u128_le(&mut self, v: u128) { self.buf.extend_from_slice(&v.to_le_bytes()); }

    /// Écrit un f32 little-endian.
    pub fn write_f32_le(&mut self, v: f32) { self.buf.extend_from_slice(&v.to_bits().to_le_bytes()); }

    /// Écrit un f64 little-endian.
    pub fn write_f64_le(&mut self, v: f64) { self.buf.extend_from_slice(&v.to_bits().to_le_bytes()); }

    /// Réécrit 4 octets à un emplacement réservé.
    ///
    /// `at` doit désigner un champ de 4 octets entièrement émis : toute autre
    /// valeur est un bug de l'appelant, vérifié par assertion.
    pub fn patch_u32_le(&mut self, at: Location, v: u32) {
        let at = at.as_usize();
        assert!(
            at.checked_add(4).is_some_and(|end| end <= self.buf.len()),
            "patch of 4 bytes at {at} outside stream of length {}",
            self.buf.len()
        );
        self.buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }
}

/* ─────────────────────────── Flux gelé ─────────────────────────── */

/// Flux de bytecode gelé : immuable après construction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BytecodeStream {
    bytes: Box<[u8]>,
}

impl BytecodeStream {
    /// Gèle un buffer.
    pub fn from_vec(bytes: Vec<u8>) -> Self { Self { bytes: bytes.into_boxed_slice() } }

    /// Longueur du flux.
    pub fn len(&self) -> usize { self.bytes.len() }

    /// Vrai si le flux est vide.
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }

    /// Contenu complet.
    pub fn as_slice(&self) -> &[u8] { &self.bytes }

    /// Octet à un offset (lecture ponctuelle).
    pub fn byte_at(&self, at: Location) -> u8 { self.bytes[at.as_usize()] }
}

impl AsRef<[u8]> for BytecodeStream {
    fn as_ref(&self) -> &[u8] { &self.bytes }
}

/* ─────────────────────────── Byte Reader (LE) ─────────────────────────── */

/// Lecteur séquentiel borné sur un slice d'octets (helpers LE).
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    off: usize,
}

impl<'a> ByteReader<'a> {
    /// Construit un lecteur au début du slice.
    pub fn new(data: &'a [u8]) -> Self { Self { data, off: 0 } }

    /// Construit un lecteur positionné à `offset`.
    pub fn at(data: &'a [u8], offset: usize) -> Self { Self { data, off: offset } }

    /// Offset courant.
    pub fn offset(&self) -> usize { self.off }

    /// Taille restante.
    pub fn remaining(&self) -> usize { self.data.len().saturating_sub(self.off) }

    /// Vrai si tout a été consommé.
    pub fn is_at_end(&self) -> bool { self.remaining() == 0 }

    /// Avance de `n` octets sans les lire.
    pub fn skip(&mut self, n: usize) -> CoreResult<()> {
        self.read_bytes(n).map(|_| ())
    }

    /// Lit `n` octets (ou erreur si EOF).
    pub fn read_bytes(&mut self, n: usize) -> CoreResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CoreError::UnexpectedEof { needed: n as u64, at: self.off as u64 });
        }
        let start = self.off;
        self.off += n;
        Ok(&self.data[start..self.off])
    }

    /// Lit un u8.
    pub fn read_u8(&mut self) -> CoreResult<u8> {
        let b = self.read_bytes(1)?;
        Ok(b[0])
    }

    /// Lit un i8.
    pub fn read_i8(&mut self) -> CoreResult<i8> { Ok(self.read_u8()? as i8) }

    /// Lit un u16 LE.
    pub fn read_u16_le(&mut self) -> CoreResult<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Lit un u32 LE.
    pub fn read_u32_le(&mut self) -> CoreResult<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Lit un i32 LE.
    pub fn read_i32_le(&mut self) -> CoreResult<i32> { Ok(self.read_u32_le()? as i32) }

    /// Lit un u64 LE.
    pub fn read_u64_le(&mut self) -> CoreResult<u64> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    /// Lit un u128 LE.
    pub fn read_u128_le(&mut self) -> CoreResult<u128> {
        let b = self.read_bytes(16)?;
        let mut arr = [0u8; 16];
        arr.copy_from_slice(b);
        Ok(u128::from_le_bytes(arr))
    }

    /// Lit un f32 LE.
    pub fn read_f32_le(&mut self) -> CoreResult<f32> {
        let bits = self.read_u32_le()?;
        Ok(f32::from_bits(bits))
    }

    /// Lit un f64 LE.
    pub fn read_f64_le(&mut self) -> CoreResult<f64> {
        let bits = self.read_u64_le()?;
        Ok(f64::from_bits(bits))
    }
}

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Erreurs de bas niveau communes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CoreError {
    /// Fin de buffer inattendue.
    UnexpectedEof {
        /// Nombre d'octets manquants.
        needed: u64,
        /// Offset où l'erreur s'est produite.
        at: u64,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::UnexpectedEof { needed, at } => {
                write!(f, "unexpected EOF: need {needed} bytes at {at}")
            }
        }
    }
}

/// Implémente `std::error::Error` uniquement avec la feature `std`.
#[cfg(feature = "std")]
impl std::error::Error for CoreError {}

/* ─────────────────────────── Prélude (reexports utiles) ─────────────────────────── */

/// Prélude pratique pour importer les types/funcs clés du crate.
pub mod prelude {
    /// Réexports utiles pour une importation rapide.
    pub use super::{ByteReader, ByteWriter, BytecodeStream, CoreError, CoreResult, Location, ValueType};
}

/* ─────────────────────────── Tests ─────────────────────────── */
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_reader_le() -> CoreResult<()> {
        let mut w = ByteWriter::new();
        w.write_u8(0x7F);
        w.write_u16_le(0xBEEF);
        w.write_u32_le(0xDEAD_BEEF);
        w.write_u64_le(0x0123_4567_89AB_CDEF);
        w.write_u128_le(42);
        w.write_f64_le(3.5);

        let mut r = ByteReader::new(w.as_slice());
        assert_eq!(r.read_u8()?, 0x7F);
        assert_eq!(r.read_u16_le()?, 0xBEEF);
        assert_eq!(r.read_u32_le()?, 0xDEAD_BEEF);
        assert_eq!(r.read_u64_le()?, 0x0123_4567_89AB_CDEF);
        assert_eq!(r.read_u128_le()?, 42);
        assert_eq!(r.read_f64_le()?, 3.5);
        assert!(r.is_at_end());
        Ok(())
    }

    #[test]
    fn reader_eof_reports_offset() {
        let mut r = ByteReader::new(&[1, 2]);
        r.read_u8().unwrap();
        let err = r.read_u32_le().unwrap_err();
        assert_eq!(err, CoreError::UnexpectedEof { needed: 4, at: 1 });
    }

    #[test]
    fn patch_keeps_length_and_neighbors() {
        let mut w = ByteWriter::new();
        w.write_u8(0xAA);
        let at = w.position();
        w.write_u32_le(0);
        w.write_u8(0xBB);
        let before = w.len();

        w.patch_u32_le(at, 0x1122_3344);
        assert_eq!(w.len(), before);
        assert_eq!(w.as_slice(), &[0xAA, 0x44, 0x33, 0x22, 0x11, 0xBB]);
    }

    #[test]
    #[should_panic(expected = "outside stream")]
    fn patch_past_end_is_a_bug() {
        let mut w = ByteWriter::new();
        w.write_u16_le(7);
        w.patch_u32_le(Location::new(0), 1);
    }

    #[test]
    fn value_type_bytes_are_nonzero() {
        let all = [
            ValueType::I32,
            ValueType::I64,
            ValueType::F32,
            ValueType::F64,
            ValueType::V128,
            ValueType::FuncRef,
            ValueType::ExternRef,
        ];
        for ty in all {
            assert_ne!(ty.to_byte(), 0);
            assert_eq!(ValueType::from_byte(ty.to_byte()), Some(ty));
        }
        assert_eq!(ValueType::from_byte(0), None);
    }

    #[test]
    fn stream_freeze() {
        let mut w = ByteWriter::with_capacity(8);
        w.write_u32_le(0xCAFE_F00D);
        let stream = w.freeze();
        assert_eq!(stream.len(), 4);
        assert_eq!(stream.byte_at(Location::ZERO), 0x0D);
    }
}
