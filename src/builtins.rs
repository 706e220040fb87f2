//! Builtin functions and type constructors.
//!
//! The tables are written as reference-page signatures using the generic GLSL type names
//! (`genFType`, `gvec4`, `gsampler2D`, ...). [`BuiltinDatabase::new`]
//! expands them into concrete overloads for one language version.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::GlslVersion;

/// Names offered as type-constructor calls, e.g. `vec3(...)`.
pub const VEC_MAT_CONSTRUCTORS: &[&str] = &[
    "vec2", "vec3", "vec4", "ivec2", "ivec3", "ivec4", "uvec2", "uvec3", "uvec4", "bvec2",
    "bvec3", "bvec4", "dvec2", "dvec3", "dvec4", "mat2", "mat3", "mat4", "mat2x2", "mat2x3",
    "mat2x4", "mat3x2", "mat3x3", "mat3x4", "mat4x2", "mat4x3", "mat4x4", "dmat2", "dmat3",
    "dmat4", "dmat2x2", "dmat2x3", "dmat2x4", "dmat3x2", "dmat3x3", "dmat3x4", "dmat4x2",
    "dmat4x3", "dmat4x4",
];

#[rustfmt::skip]
const BUILTIN_FUNCTIONS: &[(u32, &str)] = &[
    // Angle and trigonometry
    (110, "genFType radians(genFType degrees)"),
    (110, "genFType degrees(genFType radians)"),
    (110, "genFType sin(genFType angle)"),
    (110, "genFType cos(genFType angle)"),
    (110, "genFType tan(genFType angle)"),
    (110, "genFType asin(genFType x)"),
    (110, "genFType acos(genFType x)"),
    (110, "genFType atan(genFType y, genFType x)"),
    (110, "genFType atan(genFType y_over_x)"),
    (130, "genFType sinh(genFType x)"),
    (130, "genFType cosh(genFType x)"),
    (130, "genFType tanh(genFType x)"),
    (130, "genFType asinh(genFType x)"),
    (130, "genFType acosh(genFType x)"),
    (130, "genFType atanh(genFType x)"),

    // Exponential
    (110, "genFType pow(genFType x, genFType y)"),
    (110, "genFType exp(genFType x)"),
    (110, "genFType log(genFType x)"),
    (110, "genFType exp2(genFType x)"),
    (110, "genFType log2(genFType x)"),
    (110, "genFType sqrt(genFType x)"),
    (400, "genDType sqrt(genDType x)"),
    (110, "genFType inversesqrt(genFType x)"),
    (400, "genDType inversesqrt(genDType x)"),

    // Common
    (110, "genFType abs(genFType x)"),
    (130, "genIType abs(genIType x)"),
    (400, "genDType abs(genDType x)"),
    (110, "genFType sign(genFType x)"),
    (130, "genIType sign(genIType x)"),
    (400, "genDType sign(genDType x)"),
    (110, "genFType floor(genFType x)"),
    (400, "genDType floor(genDType x)"),
    (130, "genFType trunc(genFType x)"),
    (400, "genDType trunc(genDType x)"),
    (130, "genFType round(genFType x)"),
    (400, "genDType round(genDType x)"),
    (130, "genFType roundEven(genFType x)"),
    (110, "genFType ceil(genFType x)"),
    (400, "genDType ceil(genDType x)"),
    (110, "genFType fract(genFType x)"),
    (400, "genDType fract(genDType x)"),
    (110, "genFType mod(genFType x, float y)"),
    (110, "genFType mod(genFType x, genFType y)"),
    (130, "genFType modf(genFType x, out genFType i)"),
    (110, "genFType min(genFType x, genFType y)"),
    (110, "genFType min(genFType x, float y)"),
    (130, "genIType min(genIType x, genIType y)"),
    (130, "genIType min(genIType x, int y)"),
    (130, "genUType min(genUType x, genUType y)"),
    (130, "genUType min(genUType x, uint y)"),
    (400, "genDType min(genDType x, genDType y)"),
    (110, "genFType max(genFType x, genFType y)"),
    (110, "genFType max(genFType x, float y)"),
    (130, "genIType max(genIType x, genIType y)"),
    (130, "genIType max(genIType x, int y)"),
    (130, "genUType max(genUType x, genUType y)"),
    (130, "genUType max(genUType x, uint y)"),
    (400, "genDType max(genDType x, genDType y)"),
    (110, "genFType clamp(genFType x, genFType minVal, genFType maxVal)"),
    (110, "genFType clamp(genFType x, float minVal, float maxVal)"),
    (130, "genIType clamp(genIType x, genIType minVal, genIType maxVal)"),
    (130, "genIType clamp(genIType x, int minVal, int maxVal)"),
    (130, "genUType clamp(genUType x, genUType minVal, genUType maxVal)"),
    (130, "genUType clamp(genUType x, uint minVal, uint maxVal)"),
    (400, "genDType clamp(genDType x, genDType minVal, genDType maxVal)"),
    (110, "genFType mix(genFType x, genFType y, genFType a)"),
    (110, "genFType mix(genFType x, genFType y, float a)"),
    (130, "genFType mix(genFType x, genFType y, genBType a)"),
    (400, "genDType mix(genDType x, genDType y, genDType a)"),
    (110, "genFType step(genFType edge, genFType x)"),
    (110, "genFType step(float edge, genFType x)"),
    (110, "genFType smoothstep(genFType edge0, genFType edge1, genFType x)"),
    (110, "genFType smoothstep(float edge0, float edge1, genFType x)"),
    (130, "genBType isnan(genFType x)"),
    (130, "genBType isinf(genFType x)"),
    (330, "genIType floatBitsToInt(genFType value)"),
    (330, "genUType floatBitsToUint(genFType value)"),
    (330, "genFType intBitsToFloat(genIType value)"),
    (330, "genFType uintBitsToFloat(genUType value)"),
    (400, "genFType fma(genFType a, genFType b, genFType c)"),
    (400, "genFType frexp(genFType x, out genIType exp)"),
    (400, "genFType ldexp(genFType x, genIType exp)"),

    // Floating-point pack and unpack
    (400, "uint packUnorm2x16(vec2 v)"),
    (420, "uint packSnorm2x16(vec2 v)"),
    (400, "uint packUnorm4x8(vec4 v)"),
    (400, "uint packSnorm4x8(vec4 v)"),
    (400, "vec2 unpackUnorm2x16(uint p)"),
    (420, "vec2 unpackSnorm2x16(uint p)"),
    (400, "vec4 unpackUnorm4x8(uint p)"),
    (400, "vec4 unpackSnorm4x8(uint p)"),
    (420, "uint packHalf2x16(vec2 v)"),
    (420, "vec2 unpackHalf2x16(uint v)"),
    (400, "double packDouble2x32(uvec2 v)"),
    (400, "uvec2 unpackDouble2x32(double v)"),

    // Geometric
    (110, "float length(genFType x)"),
    (400, "double length(genDType x)"),
    (110, "float distance(genFType p0, genFType p1)"),
    (400, "double distance(genDType p0, genDType p1)"),
    (110, "float dot(genFType x, genFType y)"),
    (400, "double dot(genDType x, genDType y)"),
    (110, "vec3 cross(vec3 x, vec3 y)"),
    (400, "dvec3 cross(dvec3 x, dvec3 y)"),
    (110, "genFType normalize(genFType x)"),
    (400, "genDType normalize(genDType x)"),
    (110, "genFType faceforward(genFType N, genFType I, genFType Nref)"),
    (110, "genFType reflect(genFType I, genFType N)"),
    (110, "genFType refract(genFType I, genFType N, float eta)"),
    (110, "vec4 ftransform()"),

    // Matrix
    (110, "mat matrixCompMult(mat x, mat y)"),
    (120, "mat2 outerProduct(vec2 c, vec2 r)"),
    (120, "mat3 outerProduct(vec3 c, vec3 r)"),
    (120, "mat4 outerProduct(vec4 c, vec4 r)"),
    (120, "mat2 transpose(mat2 m)"),
    (120, "mat3 transpose(mat3 m)"),
    (120, "mat4 transpose(mat4 m)"),
    (120, "mat2x3 transpose(mat3x2 m)"),
    (120, "mat3x2 transpose(mat2x3 m)"),
    (120, "mat2x4 transpose(mat4x2 m)"),
    (120, "mat4x2 transpose(mat2x4 m)"),
    (120, "mat3x4 transpose(mat4x3 m)"),
    (120, "mat4x3 transpose(mat3x4 m)"),
    (150, "float determinant(mat2 m)"),
    (150, "float determinant(mat3 m)"),
    (150, "float determinant(mat4 m)"),
    (140, "mat2 inverse(mat2 m)"),
    (140, "mat3 inverse(mat3 m)"),
    (140, "mat4 inverse(mat4 m)"),

    // Vector relational
    (110, "bvec lessThan(vec x, vec y)"),
    (110, "bvec lessThan(ivec x, ivec y)"),
    (130, "bvec lessThan(uvec x, uvec y)"),
    (110, "bvec lessThanEqual(vec x, vec y)"),
    (110, "bvec lessThanEqual(ivec x, ivec y)"),
    (130, "bvec lessThanEqual(uvec x, uvec y)"),
    (110, "bvec greaterThan(vec x, vec y)"),
    (110, "bvec greaterThan(ivec x, ivec y)"),
    (130, "bvec greaterThan(uvec x, uvec y)"),
    (110, "bvec greaterThanEqual(vec x, vec y)"),
    (110, "bvec greaterThanEqual(ivec x, ivec y)"),
    (130, "bvec greaterThanEqual(uvec x, uvec y)"),
    (110, "bvec equal(vec x, vec y)"),
    (110, "bvec equal(ivec x, ivec y)"),
    (130, "bvec equal(uvec x, uvec y)"),
    (110, "bvec equal(bvec x, bvec y)"),
    (110, "bvec notEqual(vec x, vec y)"),
    (110, "bvec notEqual(ivec x, ivec y)"),
    (130, "bvec notEqual(uvec x, uvec y)"),
    (110, "bvec notEqual(bvec x, bvec y)"),
    (110, "bool any(bvec x)"),
    (110, "bool all(bvec x)"),
    (110, "bvec not(bvec x)"),

    // Integer
    (400, "genUType uaddCarry(genUType x, genUType y, out genUType carry)"),
    (400, "genUType usubBorrow(genUType x, genUType y, out genUType borrow)"),
    (400, "void umulExtended(genUType x, genUType y, out genUType msb, out genUType lsb)"),
    (400, "void imulExtended(genIType x, genIType y, out genIType msb, out genIType lsb)"),
    (400, "genIType bitfieldExtract(genIType value, int offset, int bits)"),
    (400, "genUType bitfieldExtract(genUType value, int offset, int bits)"),
    (400, "genIType bitfieldInsert(genIType base, genIType insert, int offset, int bits)"),
    (400, "genUType bitfieldInsert(genUType base, genUType insert, int offset, int bits)"),
    (400, "genIType bitfieldReverse(genIType value)"),
    (400, "genUType bitfieldReverse(genUType value)"),
    (400, "genIType bitCount(genIType value)"),
    (400, "genIType bitCount(genUType value)"),
    (400, "genIType findLSB(genIType value)"),
    (400, "genIType findLSB(genUType value)"),
    (400, "genIType findMSB(genIType value)"),
    (400, "genIType findMSB(genUType value)"),

    // Texture queries
    (130, "int textureSize(gsampler1D sampler, int lod)"),
    (130, "ivec2 textureSize(gsampler2D sampler, int lod)"),
    (130, "ivec3 textureSize(gsampler3D sampler, int lod)"),
    (130, "ivec2 textureSize(gsamplerCube sampler, int lod)"),
    (130, "ivec2 textureSize(sampler2DShadow sampler, int lod)"),
    (130, "ivec3 textureSize(gsampler2DArray sampler, int lod)"),
    (140, "ivec2 textureSize(gsampler2DRect sampler)"),
    (140, "int textureSize(gsamplerBuffer sampler)"),
    (150, "ivec2 textureSize(gsampler2DMS sampler)"),
    (400, "vec2 textureQueryLod(gsampler2D sampler, vec2 P)"),
    (430, "int textureQueryLevels(gsampler2D sampler)"),
    (450, "int textureSamples(gsampler2DMS sampler)"),

    // Texel lookup
    (130, "gvec4 texture(gsampler1D sampler, float P)"),
    (130, "gvec4 texture(gsampler2D sampler, vec2 P)"),
    (130, "gvec4 texture(gsampler2D sampler, vec2 P, float bias)"),
    (130, "gvec4 texture(gsampler3D sampler, vec3 P)"),
    (130, "gvec4 texture(gsamplerCube sampler, vec3 P)"),
    (130, "float texture(sampler2DShadow sampler, vec3 P)"),
    (130, "float texture(samplerCubeShadow sampler, vec4 P)"),
    (130, "gvec4 texture(gsampler2DArray sampler, vec3 P)"),
    (400, "gvec4 texture(gsamplerCubeArray sampler, vec4 P)"),
    (130, "float texture(sampler2DArrayShadow sampler, vec4 P)"),
    (130, "gvec4 textureProj(gsampler2D sampler, vec3 P)"),
    (130, "gvec4 textureProj(gsampler2D sampler, vec4 P)"),
    (130, "gvec4 textureProj(gsampler3D sampler, vec4 P)"),
    (130, "float textureProj(sampler2DShadow sampler, vec4 P)"),
    (130, "gvec4 textureLod(gsampler1D sampler, float P, float lod)"),
    (130, "gvec4 textureLod(gsampler2D sampler, vec2 P, float lod)"),
    (130, "gvec4 textureLod(gsampler3D sampler, vec3 P, float lod)"),
    (130, "gvec4 textureLod(gsamplerCube sampler, vec3 P, float lod)"),
    (130, "float textureLod(sampler2DShadow sampler, vec3 P, float lod)"),
    (130, "gvec4 textureLod(gsampler2DArray sampler, vec3 P, float lod)"),
    (130, "gvec4 textureOffset(gsampler2D sampler, vec2 P, ivec2 offset)"),
    (130, "gvec4 textureOffset(gsampler3D sampler, vec3 P, ivec3 offset)"),
    (130, "gvec4 textureOffset(gsampler2DArray sampler, vec3 P, ivec2 offset)"),
    (130, "gvec4 texelFetch(gsampler1D sampler, int P, int lod)"),
    (130, "gvec4 texelFetch(gsampler2D sampler, ivec2 P, int lod)"),
    (130, "gvec4 texelFetch(gsampler3D sampler, ivec3 P, int lod)"),
    (130, "gvec4 texelFetch(gsampler2DArray sampler, ivec3 P, int lod)"),
    (140, "gvec4 texelFetch(gsamplerBuffer sampler, int P)"),
    (150, "gvec4 texelFetch(gsampler2DMS sampler, ivec2 P, int sample)"),
    (130, "gvec4 texelFetchOffset(gsampler2D sampler, ivec2 P, int lod, ivec2 offset)"),
    (130, "gvec4 textureProjOffset(gsampler2D sampler, vec3 P, ivec2 offset)"),
    (130, "gvec4 textureLodOffset(gsampler2D sampler, vec2 P, float lod, ivec2 offset)"),
    (130, "gvec4 textureProjLod(gsampler2D sampler, vec3 P, float lod)"),
    (130, "gvec4 textureGrad(gsampler2D sampler, vec2 P, vec2 dPdx, vec2 dPdy)"),
    (130, "gvec4 textureGrad(gsampler3D sampler, vec3 P, vec3 dPdx, vec3 dPdy)"),
    (130, "gvec4 textureGrad(gsamplerCube sampler, vec3 P, vec3 dPdx, vec3 dPdy)"),
    (130, "gvec4 textureGradOffset(gsampler2D sampler, vec2 P, vec2 dPdx, vec2 dPdy, ivec2 offset)"),
    (400, "gvec4 textureGather(gsampler2D sampler, vec2 P)"),
    (400, "gvec4 textureGather(gsampler2D sampler, vec2 P, int comp)"),
    (400, "vec4 textureGather(sampler2DShadow sampler, vec2 P, float refZ)"),
    (400, "gvec4 textureGatherOffset(gsampler2D sampler, vec2 P, ivec2 offset)"),

    // Legacy texture functions
    (110, "vec4 texture1D(sampler1D sampler, float coord)"),
    (110, "vec4 texture2D(sampler2D sampler, vec2 coord)"),
    (110, "vec4 texture2D(sampler2D sampler, vec2 coord, float bias)"),
    (110, "vec4 texture2DProj(sampler2D sampler, vec3 coord)"),
    (110, "vec4 texture2DLod(sampler2D sampler, vec2 coord, float lod)"),
    (110, "vec4 texture3D(sampler3D sampler, vec3 coord)"),
    (110, "vec4 textureCube(samplerCube sampler, vec3 coord)"),
    (110, "vec4 textureCubeLod(samplerCube sampler, vec3 coord, float lod)"),
    (110, "vec4 shadow2D(sampler2DShadow sampler, vec3 coord)"),

    // Atomic counters and memory
    (420, "uint atomicCounterIncrement(atomic_uint c)"),
    (420, "uint atomicCounterDecrement(atomic_uint c)"),
    (420, "uint atomicCounter(atomic_uint c)"),
    (430, "uint atomicAdd(inout uint mem, uint data)"),
    (430, "int atomicAdd(inout int mem, int data)"),
    (430, "uint atomicMin(inout uint mem, uint data)"),
    (430, "int atomicMin(inout int mem, int data)"),
    (430, "uint atomicMax(inout uint mem, uint data)"),
    (430, "int atomicMax(inout int mem, int data)"),
    (430, "uint atomicAnd(inout uint mem, uint data)"),
    (430, "int atomicAnd(inout int mem, int data)"),
    (430, "uint atomicOr(inout uint mem, uint data)"),
    (430, "int atomicOr(inout int mem, int data)"),
    (430, "uint atomicXor(inout uint mem, uint data)"),
    (430, "int atomicXor(inout int mem, int data)"),
    (430, "uint atomicExchange(inout uint mem, uint data)"),
    (430, "int atomicExchange(inout int mem, int data)"),
    (430, "uint atomicCompSwap(inout uint mem, uint compare, uint data)"),
    (430, "int atomicCompSwap(inout int mem, int compare, int data)"),

    // Images
    (420, "ivec2 imageSize(gimage2D image)"),
    (420, "ivec3 imageSize(gimage3D image)"),
    (420, "ivec3 imageSize(gimage2DArray image)"),
    (420, "gvec4 imageLoad(gimage2D image, ivec2 P)"),
    (420, "gvec4 imageLoad(gimage3D image, ivec3 P)"),
    (420, "gvec4 imageLoad(gimage2DArray image, ivec3 P)"),
    (420, "void imageStore(gimage2D image, ivec2 P, gvec4 data)"),
    (420, "void imageStore(gimage3D image, ivec3 P, gvec4 data)"),
    (420, "void imageStore(gimage2DArray image, ivec3 P, gvec4 data)"),
    (420, "uint imageAtomicAdd(uimage2D image, ivec2 P, uint data)"),
    (420, "int imageAtomicAdd(iimage2D image, ivec2 P, int data)"),
    (420, "uint imageAtomicExchange(uimage2D image, ivec2 P, uint data)"),
    (420, "int imageAtomicExchange(iimage2D image, ivec2 P, int data)"),
    (420, "uint imageAtomicCompSwap(uimage2D image, ivec2 P, uint compare, uint data)"),
    (420, "int imageAtomicCompSwap(iimage2D image, ivec2 P, int compare, int data)"),

    // Fragment processing
    (110, "genFType dFdx(genFType p)"),
    (110, "genFType dFdy(genFType p)"),
    (450, "genFType dFdxFine(genFType p)"),
    (450, "genFType dFdyFine(genFType p)"),
    (450, "genFType dFdxCoarse(genFType p)"),
    (450, "genFType dFdyCoarse(genFType p)"),
    (110, "genFType fwidth(genFType p)"),
    (450, "genFType fwidthFine(genFType p)"),
    (450, "genFType fwidthCoarse(genFType p)"),
    (400, "genFType interpolateAtCentroid(genFType interpolant)"),
    (400, "genFType interpolateAtSample(genFType interpolant, int sample)"),
    (400, "genFType interpolateAtOffset(genFType interpolant, vec2 offset)"),

    // Geometry shader
    (150, "void EmitVertex()"),
    (150, "void EndPrimitive()"),
    (400, "void EmitStreamVertex(int stream)"),
    (400, "void EndStreamPrimitive(int stream)"),

    // Shader invocation control and memory barriers
    (400, "void barrier()"),
    (420, "void memoryBarrier()"),
    (420, "void memoryBarrierAtomicCounter()"),
    (430, "void memoryBarrierBuffer()"),
    (430, "void memoryBarrierShared()"),
    (420, "void memoryBarrierImage()"),
    (430, "void groupMemoryBarrier()"),
];

/// Types substituted position-by-position: every generic in a signature takes the same index.
const SIZE_GENERICS: &[(&str, &[&str])] = &[
    ("genFType", &["float", "vec2", "vec3", "vec4"]),
    ("genIType", &["int", "ivec2", "ivec3", "ivec4"]),
    ("genUType", &["uint", "uvec2", "uvec3", "uvec4"]),
    ("genBType", &["bool", "bvec2", "bvec3", "bvec4"]),
    ("genDType", &["double", "dvec2", "dvec3", "dvec4"]),
];

const VECTOR_GENERICS: &[(&str, &[&str])] = &[
    ("vec", &["vec2", "vec3", "vec4"]),
    ("ivec", &["ivec2", "ivec3", "ivec4"]),
    ("uvec", &["uvec2", "uvec3", "uvec4"]),
    ("bvec", &["bvec2", "bvec3", "bvec4"]),
    ("dvec", &["dvec2", "dvec3", "dvec4"]),
];

const MATRIX_GENERICS: &[(&str, &[&str])] = &[(
    "mat",
    &["mat2", "mat3", "mat4", "mat2x3", "mat2x4", "mat3x2", "mat3x4", "mat4x2", "mat4x3"],
)];

const SAMPLER_PREFIXES: &[&str] = &["", "i", "u"];

lazy_static! {
    static ref SIGNATURE_RE: Regex = Regex::new(r"^\s*(\w+)\s+(\w+)\s*\((.*)\)\s*$").unwrap();
    static ref PARAMETER_RE: Regex =
        Regex::new(r"^\s*(?:(in|out|inout)\s+)?(\w+)\s+(\w+)\s*$").unwrap();
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltinParameter {
    /// `in`, `out` or `inout`, when written
    pub qualifier: Option<String>,
    pub ty: String,
    pub name: String,
}

impl fmt::Display for BuiltinParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(qualifier) = &self.qualifier {
            write!(f, "{} ", qualifier)?;
        }
        write!(f, "{} {}", self.ty, self.name)
    }
}

/// One concrete signature of a builtin function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltinFunctionOverload {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<BuiltinParameter>,

    /// First desktop GLSL version providing this overload
    pub min_version: u32,
}

impl BuiltinFunctionOverload {
    pub fn parameter_types(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.ty.as_str()).collect()
    }

    /// `name(type a, type b)`, as shown in completion lists.
    pub fn label(&self) -> String {
        let params: Vec<String> = self.parameters.iter().map(ToString::to_string).collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

impl fmt::Display for BuiltinFunctionOverload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.return_type, self.label())
    }
}

/// Parsed but not yet expanded signature from the table.
#[derive(Clone, Debug)]
struct Signature {
    return_type: String,
    name: String,
    parameters: Vec<BuiltinParameter>,
}

impl Signature {
    fn parse(signature: &str) -> Option<Signature> {
        let captures = SIGNATURE_RE.captures(signature)?;
        let params = captures[3].trim();

        let parameters = if params.is_empty() || params == "void" {
            Vec::new()
        } else {
            params
                .split(',')
                .map(|p| {
                    let c = PARAMETER_RE.captures(p)?;
                    Some(BuiltinParameter {
                        qualifier: c.get(1).map(|m| m.as_str().to_string()),
                        ty: c[2].to_string(),
                        name: c[3].to_string(),
                    })
                })
                .collect::<Option<Vec<_>>>()?
        };

        Some(Signature {
            return_type: captures[1].to_string(),
            name: captures[2].to_string(),
            parameters,
        })
    }

    fn types(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.return_type.as_str()).chain(self.parameters.iter().map(|p| p.ty.as_str()))
    }

    fn map_types(&self, f: impl Fn(&str) -> String) -> Signature {
        Signature {
            return_type: f(&self.return_type),
            name: self.name.clone(),
            parameters: self
                .parameters
                .iter()
                .map(|p| BuiltinParameter {
                    ty: f(&p.ty),
                    ..p.clone()
                })
                .collect(),
        }
    }

    /// Expand one family of index-aligned generics, e.g. `genFType` and `genIType` together.
    fn expand_aligned(self, generics: &[(&str, &[&str])]) -> Vec<Signature> {
        let lookup = |ty: &str| generics.iter().find(|(g, _)| *g == ty).map(|(_, c)| *c);
        let found = self.types().find_map(lookup);
        let count = match found {
            Some(concrete) => concrete.len(),
            None => return vec![self],
        };

        (0..count)
            .map(|i| self.map_types(|ty| lookup(ty).map_or_else(|| ty.to_string(), |c| c[i].to_string())))
            .collect()
    }

    /// Expand `gvec4`, `gsampler*` and `gimage*` over the float, int and uint variants.
    fn expand_prefixed(self) -> Vec<Signature> {
        let prefixed = |ty: &str| ty == "gvec4" || ty.starts_with("gsampler") || ty.starts_with("gimage");
        if !self.types().any(prefixed) {
            return vec![self];
        }

        SAMPLER_PREFIXES
            .iter()
            .map(|prefix| {
                self.map_types(|ty| {
                    if prefixed(ty) {
                        format!("{}{}", prefix, &ty[1..])
                    } else {
                        ty.to_string()
                    }
                })
            })
            .collect()
    }

    fn expand(self) -> Vec<Signature> {
        let mut out = Vec::new();
        let sized = if self.types().any(|ty| SIZE_GENERICS.iter().any(|(g, _)| *g == ty)) {
            self.expand_aligned(SIZE_GENERICS)
        } else {
            self.expand_aligned(VECTOR_GENERICS)
        };
        for signature in sized {
            for signature in signature.expand_prefixed() {
                out.extend(signature.expand_aligned(MATRIX_GENERICS));
            }
        }
        out
    }
}

/// Read-only table of builtin functions for one GLSL version.
///
/// Build it once and share it by reference (typically in an `Arc`); there is no global instance.
#[derive(Debug)]
pub struct BuiltinDatabase {
    version: GlslVersion,
    functions: Vec<(String, Vec<BuiltinFunctionOverload>)>,
    index: HashMap<String, usize>,
}

impl BuiltinDatabase {
    pub fn new(version: GlslVersion) -> Self {
        let max_version = version.desktop_equivalent();
        let mut functions: Vec<(String, Vec<BuiltinFunctionOverload>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for &(min_version, text) in BUILTIN_FUNCTIONS {
            if min_version > max_version {
                continue;
            }

            let signature = match Signature::parse(text) {
                Some(signature) => signature,
                None => {
                    log::warn!("skipping malformed builtin signature {:?}", text);
                    continue;
                }
            };

            for concrete in signature.expand() {
                let slot = *index.entry(concrete.name.clone()).or_insert_with(|| {
                    functions.push((concrete.name.clone(), Vec::new()));
                    functions.len() - 1
                });
                let overloads = &mut functions[slot].1;

                let overload = BuiltinFunctionOverload {
                    name: concrete.name,
                    return_type: concrete.return_type,
                    parameters: concrete.parameters,
                    min_version,
                };

                if overloads
                    .iter()
                    .all(|o| o.parameter_types() != overload.parameter_types())
                {
                    overloads.push(overload);
                }
            }
        }

        log::debug!(
            "built builtin database for GLSL {}: {} functions",
            version,
            functions.len()
        );

        BuiltinDatabase {
            version,
            functions,
            index,
        }
    }

    pub fn version(&self) -> GlslVersion {
        self.version
    }

    /// Every builtin function with its overloads, in table order.
    pub fn functions(&self) -> impl Iterator<Item = (&str, &[BuiltinFunctionOverload])> {
        self.functions
            .iter()
            .map(|(name, overloads)| (name.as_str(), overloads.as_slice()))
    }

    pub fn function(&self, name: &str) -> Option<&[BuiltinFunctionOverload]> {
        self.index
            .get(name)
            .map(|&i| self.functions[i].1.as_slice())
    }

    /// Functions whose lowercased name contains the lowercased `name_prefix` anywhere.
    pub fn lookup_functions(&self, name_prefix: &str) -> Vec<(&str, &[BuiltinFunctionOverload])> {
        let needle = name_prefix.to_lowercase();
        self.functions()
            .filter(|(name, _)| name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn list_vector_matrix_constructors(&self) -> &'static [&'static str] {
        VEC_MAT_CONSTRUCTORS
    }

    pub fn types(&self) -> &'static [&'static str] {
        crate::token::BUILTIN_TYPE_KEYWORDS
    }
}

impl Default for BuiltinDatabase {
    fn default() -> Self {
        BuiltinDatabase::new(GlslVersion::default())
    }
}
