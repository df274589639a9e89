//! The `.level` container: a ZIP archive holding a manifest
//! (`metadata.json`), a level descriptor (`level.json`), and zero or more
//! custom shape files (`*.shape.json`).
//!
//! The codec is the crate's only I/O boundary and is pure: the same
//! logical content always encodes to the same bytes (fixed member order,
//! fixed timestamps, pretty-printed JSON). Unknown archive members are
//! ignored on read; missing required members, malformed JSON, and dangling
//! shape references are fatal.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::board::Board;
use crate::shape::Shape;

const METADATA_MEMBER: &str = "metadata.json";
const LEVEL_MEMBER: &str = "level.json";
const SHAPE_MEMBER_SUFFIX: &str = ".shape.json";

/// Errors raised while reading, writing, or resolving a `.level` archive.
#[derive(Debug, Error)]
pub enum LevelError {
    /// A required archive member is absent.
    #[error("archive member `{0}` is missing")]
    MissingMember(&'static str),
    /// An archive member holds syntactically or structurally invalid JSON.
    #[error("malformed JSON in `{member}`: {source}")]
    MalformedJson {
        /// The archive member that failed to parse.
        member: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// The ZIP container itself is unreadable or unwritable.
    #[error("archive failure: {0}")]
    Archive(#[from] zip::result::ZipError),
    /// Plain I/O failure while reading or writing member bytes.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
    /// `metadata.json` declares an unsupported format version.
    #[error("unsupported level format version {0}")]
    UnsupportedVersion(i64),
    /// A field holds a value outside its documented range.
    #[error("invalid value for `{field}`: {detail}")]
    InvalidField {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What was wrong with it.
        detail: String,
    },
    /// `level.json` references a shape id that `metadata.json` does not
    /// index.
    #[error("level references shape id `{0}` absent from the shape index")]
    UnindexedShape(String),
    /// A shape source string is neither `builtin:<name>` nor
    /// `custom:<filename>`.
    #[error("shape id `{id}` has unrecognized source `{source_str}`")]
    UnknownSource {
        /// The shape id whose source failed to parse.
        id: String,
        /// The unparsable source string.
        source_str: String,
    },
    /// A custom shape source points at a file the archive does not contain.
    #[error("shape id `{id}` refers to missing custom file `{file}`")]
    MissingCustomFile {
        /// The referencing shape id.
        id: String,
        /// The missing member name.
        file: String,
    },
    /// A builtin shape source names a shape the caller's registry lacks.
    #[error("shape id `{id}` refers to unknown builtin `{name}`")]
    MissingBuiltin {
        /// The referencing shape id.
        id: String,
        /// The unknown builtin name.
        name: String,
    },
}

/// Where a shape id's definition lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeSource {
    /// A shape shipped with the game, looked up by name at resolve time.
    Builtin(String),
    /// A shape carried inside the archive as `<filename>`.
    Custom(String),
}

impl ShapeSource {
    /// Parse a `builtin:<name>` / `custom:<filename>` source string.
    pub fn parse(id: &str, source: &str) -> Result<Self, LevelError> {
        if let Some(name) = source.strip_prefix("builtin:") {
            Ok(ShapeSource::Builtin(name.to_owned()))
        } else if let Some(file) = source.strip_prefix("custom:") {
            Ok(ShapeSource::Custom(file.to_owned()))
        } else {
            Err(LevelError::UnknownSource {
                id: id.to_owned(),
                source_str: source.to_owned(),
            })
        }
    }

    /// The wire form of this source.
    pub fn to_source_string(&self) -> String {
        match self {
            ShapeSource::Builtin(name) => format!("builtin:{}", name),
            ShapeSource::Custom(file) => format!("custom:{}", file),
        }
    }
}

/// `metadata.json`: the archive manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelMetadata {
    /// Format version, at least 1.
    pub version: i64,
    /// Shape id to source string (`builtin:<name>` / `custom:<filename>`).
    pub shape_index: BTreeMap<String, String>,
    /// Shape id to display color, `#RRGGBB`.
    pub color_index: BTreeMap<String, String>,
    /// Optional author credit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional creation timestamp, as the author wrote it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// `level.json`: the playable puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDescriptor {
    /// Stable level identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Difficulty rating, 1 through 5.
    pub difficulty: u8,
    /// Board height.
    pub rows: usize,
    /// Board width.
    pub cols: usize,
    /// Target mask, one string per row, `'#'` = filled, `'.'` = empty.
    /// Absent means every cell is a target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Vec<String>>,
    /// The shape multiset of the puzzle, by shape id; repeats allowed.
    pub shape_ids: Vec<String>,
}

impl LevelDescriptor {
    /// The target as a row-major boolean mask, if one is declared.
    ///
    /// Validates the row count and row widths against `rows`/`cols`.
    pub fn target_mask(&self) -> Result<Option<Vec<bool>>, LevelError> {
        let Some(lines) = &self.target else {
            return Ok(None);
        };
        if lines.len() != self.rows {
            return Err(LevelError::InvalidField {
                field: "level.target",
                detail: format!("expected {} rows, found {}", self.rows, lines.len()),
            });
        }

        let mut mask = Vec::with_capacity(self.rows * self.cols);
        for line in lines {
            if line.len() != self.cols {
                return Err(LevelError::InvalidField {
                    field: "level.target",
                    detail: format!("expected {} columns, found row `{}`", self.cols, line),
                });
            }
            for c in line.chars() {
                match c {
                    '#' => mask.push(true),
                    '.' => mask.push(false),
                    other => {
                        return Err(LevelError::InvalidField {
                            field: "level.target",
                            detail: format!("unknown cell character `{}`", other),
                        })
                    }
                }
            }
        }
        Ok(Some(mask))
    }

    /// Build the playable board: empty grid, target installed when the
    /// descriptor declares one.
    pub fn to_board(&self) -> Result<Board, LevelError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(LevelError::InvalidField {
                field: "level.rows",
                detail: "board dimensions must be non-zero".to_owned(),
            });
        }
        let mut board = Board::new(self.rows, self.cols);
        if let Some(mask) = self.target_mask()? {
            board.set_target(mask);
        }
        Ok(board)
    }
}

/// A `*.shape.json` member: one custom shape definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeFile {
    /// The shape id this file defines.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Mask, one string per row, `'#'` = filled, `'.'` = empty.
    pub matrix: Vec<String>,
    /// Anchor row; `-1` requests the auto-centered default.
    pub anchor_row: i32,
    /// Anchor column; `-1` requests the auto-centered default.
    pub anchor_col: i32,
}

impl ShapeFile {
    /// Decode the mask and anchor into a [`Shape`].
    pub fn to_shape(&self) -> Result<Shape, LevelError> {
        if self.matrix.is_empty() {
            return Err(LevelError::InvalidField {
                field: "shape.matrix",
                detail: format!("shape `{}` has an empty matrix", self.id),
            });
        }
        let rows = self.matrix.len();
        let cols = self.matrix[0].len();
        if cols == 0 {
            return Err(LevelError::InvalidField {
                field: "shape.matrix",
                detail: format!("shape `{}` has an empty first row", self.id),
            });
        }

        let mut mask = Vec::with_capacity(rows * cols);
        for line in &self.matrix {
            if line.len() != cols {
                return Err(LevelError::InvalidField {
                    field: "shape.matrix",
                    detail: format!("shape `{}` has ragged rows", self.id),
                });
            }
            for c in line.chars() {
                match c {
                    '#' => mask.push(true),
                    '.' => mask.push(false),
                    other => {
                        return Err(LevelError::InvalidField {
                            field: "shape.matrix",
                            detail: format!("shape `{}` uses unknown character `{}`", self.id, other),
                        })
                    }
                }
            }
        }

        if self.anchor_row < 0 || self.anchor_col < 0 {
            Ok(Shape::new(rows, cols, mask))
        } else {
            let (anchor_row, anchor_col) = (self.anchor_row as usize, self.anchor_col as usize);
            if anchor_row >= rows || anchor_col >= cols {
                return Err(LevelError::InvalidField {
                    field: "shape.anchorRow",
                    detail: format!(
                        "shape `{}` anchor ({}, {}) is outside its {}x{} matrix",
                        self.id, anchor_row, anchor_col, rows, cols
                    ),
                });
            }
            Ok(Shape::with_anchor(rows, cols, mask, anchor_row, anchor_col))
        }
    }

    /// Encode a [`Shape`] as a shape file under `id`/`name`.
    pub fn from_shape(id: &str, name: &str, shape: &Shape) -> Self {
        let matrix = (0..shape.rows())
            .map(|row| {
                (0..shape.cols())
                    .map(|col| if shape.filled(row, col) { '#' } else { '.' })
                    .collect()
            })
            .collect();
        let (anchor_row, anchor_col) = shape.anchor();

        ShapeFile {
            id: id.to_owned(),
            name: name.to_owned(),
            matrix,
            anchor_row: anchor_row as i32,
            anchor_col: anchor_col as i32,
        }
    }
}

/// The logical content of one `.level` archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelPackage {
    /// The manifest.
    pub metadata: LevelMetadata,
    /// The level descriptor.
    pub level: LevelDescriptor,
    /// Custom shape files, keyed by their member filename.
    pub custom_shapes: BTreeMap<String, ShapeFile>,
}

impl LevelPackage {
    /// Encode the package as archive bytes.
    ///
    /// Members are written in a fixed order (`metadata.json`, `level.json`,
    /// custom shapes by filename) with a fixed timestamp, so equal packages
    /// encode to equal bytes.
    pub fn encode(&self) -> Result<Vec<u8>, LevelError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        writer.start_file(METADATA_MEMBER, options)?;
        writer.write_all(&to_pretty_json(&self.metadata)?)?;

        writer.start_file(LEVEL_MEMBER, options)?;
        writer.write_all(&to_pretty_json(&self.level)?)?;

        for (filename, shape_file) in &self.custom_shapes {
            writer.start_file(filename.as_str(), options)?;
            writer.write_all(&to_pretty_json(shape_file)?)?;
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Decode archive bytes into a package.
    ///
    /// Unknown members are ignored. Fatal: a missing required member,
    /// malformed JSON anywhere, a version below 1, a difficulty outside
    /// 1..=5, a `shapeIds` entry missing from the shape index, an
    /// unparsable source string, or a custom source whose file is absent.
    pub fn decode(bytes: &[u8]) -> Result<Self, LevelError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let metadata_bytes = read_member(&mut archive, METADATA_MEMBER)?
            .ok_or(LevelError::MissingMember(METADATA_MEMBER))?;
        let metadata: LevelMetadata = from_member_json(METADATA_MEMBER, &metadata_bytes)?;
        if metadata.version < 1 {
            return Err(LevelError::UnsupportedVersion(metadata.version));
        }

        let level_bytes = read_member(&mut archive, LEVEL_MEMBER)?
            .ok_or(LevelError::MissingMember(LEVEL_MEMBER))?;
        let level: LevelDescriptor = from_member_json(LEVEL_MEMBER, &level_bytes)?;
        if !(1..=5).contains(&level.difficulty) {
            return Err(LevelError::InvalidField {
                field: "level.difficulty",
                detail: format!("expected 1..=5, found {}", level.difficulty),
            });
        }
        // Surface mask problems at decode time rather than first use.
        level.target_mask()?;

        let mut custom_shapes = BTreeMap::new();
        let member_names: Vec<String> = archive.file_names().map(str::to_owned).collect();
        for member in member_names {
            if !member.ends_with(SHAPE_MEMBER_SUFFIX) {
                continue;
            }
            let bytes = read_member(&mut archive, &member)?
                .ok_or(LevelError::MissingMember(SHAPE_MEMBER_SUFFIX))?;
            let shape_file: ShapeFile = from_member_json(&member, &bytes)?;
            custom_shapes.insert(member, shape_file);
        }

        // Every referenced shape id must be indexed, its source must parse,
        // and custom sources must point at members we actually hold.
        for shape_id in &level.shape_ids {
            let source = metadata
                .shape_index
                .get(shape_id)
                .ok_or_else(|| LevelError::UnindexedShape(shape_id.clone()))?;
            if let ShapeSource::Custom(file) = ShapeSource::parse(shape_id, source)? {
                if !custom_shapes.contains_key(&file) {
                    return Err(LevelError::MissingCustomFile {
                        id: shape_id.clone(),
                        file,
                    });
                }
            }
        }

        Ok(LevelPackage {
            metadata,
            level,
            custom_shapes,
        })
    }

    /// Resolve the level's shape multiset against `builtins`, in
    /// `shapeIds` order.
    ///
    /// Fatal: a builtin source naming a shape the registry lacks. Custom
    /// sources were already checked for presence at decode time; their
    /// masks are decoded here.
    pub fn resolve_shapes(
        &self,
        builtins: &BTreeMap<String, Shape>,
    ) -> Result<Vec<Shape>, LevelError> {
        let mut shapes = Vec::with_capacity(self.level.shape_ids.len());
        for shape_id in &self.level.shape_ids {
            let source = self
                .metadata
                .shape_index
                .get(shape_id)
                .ok_or_else(|| LevelError::UnindexedShape(shape_id.clone()))?;
            match ShapeSource::parse(shape_id, source)? {
                ShapeSource::Builtin(name) => {
                    let shape = builtins.get(&name).ok_or_else(|| LevelError::MissingBuiltin {
                        id: shape_id.clone(),
                        name: name.clone(),
                    })?;
                    shapes.push(shape.clone());
                }
                ShapeSource::Custom(file) => {
                    let shape_file =
                        self.custom_shapes
                            .get(&file)
                            .ok_or_else(|| LevelError::MissingCustomFile {
                                id: shape_id.clone(),
                                file: file.clone(),
                            })?;
                    shapes.push(shape_file.to_shape()?);
                }
            }
        }
        Ok(shapes)
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, LevelError> {
    serde_json::to_vec_pretty(value).map_err(|source| LevelError::MalformedJson {
        member: "<encoding>".to_owned(),
        source,
    })
}

fn from_member_json<'a, T: Deserialize<'a>>(
    member: &str,
    bytes: &'a [u8],
) -> Result<T, LevelError> {
    serde_json::from_slice(bytes).map_err(|source| LevelError::MalformedJson {
        member: member.to_owned(),
        source,
    })
}

fn read_member(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<Vec<u8>>, LevelError> {
    match archive.by_name(name) {
        Ok(mut member) => {
            let mut bytes = Vec::with_capacity(member.size() as usize);
            member.read_to_end(&mut bytes)?;
            Ok(Some(bytes))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}
