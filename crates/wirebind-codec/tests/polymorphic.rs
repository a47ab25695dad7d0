use std::any::Any;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use wirebind_codec::{
    AdapterKind, AdapterRegistry, CodecError, FieldSpec, Polymorphic, RecordSchema,
    RegistryBuilder, TypeAdapter, TypeDesc, WireContext, WireType,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Relay {
    on: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Dimmer {
    level: u8,
    ramp_ms: u16,
}

impl WireType for Relay {}
impl WireType for Dimmer {}

#[derive(Debug, Clone, PartialEq)]
enum Device {
    Relay(Relay),
    Dimmer(Dimmer),
}

impl WireType for Device {
    fn describe() -> TypeDesc {
        TypeDesc::polymorphic::<Self>()
    }
}

impl Polymorphic for Device {
    fn concrete(&self) -> (TypeDesc, &dyn Any) {
        match self {
            Device::Relay(relay) => (TypeDesc::of::<Relay>(), relay),
            Device::Dimmer(dimmer) => (TypeDesc::of::<Dimmer>(), dimmer),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
struct Panel {
    id: u8,
    devices: Vec<Device>,
}

impl WireType for Panel {}

fn builder() -> RegistryBuilder {
    let mut builder = AdapterRegistry::builder();
    builder
        .register_record(
            RecordSchema::<Relay>::new().field("on", FieldSpec::new(), |r: &Relay| &r.on, |r, v| {
                r.on = v
            }),
        )
        .unwrap();
    builder
        .register_record(
            RecordSchema::<Dimmer>::new()
                .field("level", FieldSpec::new(), |d: &Dimmer| &d.level, |d, v| d.level = v)
                .field(
                    "ramp_ms",
                    FieldSpec::new().length(2),
                    |d: &Dimmer| &d.ramp_ms,
                    |d, v| d.ramp_ms = v,
                ),
        )
        .unwrap();
    builder
        .register_record(
            RecordSchema::<Panel>::new()
                .field("id", FieldSpec::new(), |p: &Panel| &p.id, |p, v| p.id = v)
                .field(
                    "devices",
                    FieldSpec::new().length(2),
                    |p: &Panel| &p.devices,
                    |p, v| p.devices = v,
                ),
        )
        .unwrap();
    builder
}

fn panel() -> Panel {
    Panel {
        id: 7,
        devices: vec![
            Device::Relay(Relay { on: true }),
            Device::Dimmer(Dimmer {
                level: 50,
                ramp_ms: 300,
            }),
        ],
    }
}

#[test]
fn variants_encode_with_their_record_layout() {
    let registry = builder().build();
    let wire = registry.to_bytes(&panel(), 1).unwrap();
    assert_eq!(wire.as_ref(), &[7, 1, 50, 0x2C, 0x01]);
}

#[test]
fn untagged_family_cannot_be_decoded() {
    let registry = builder().build();
    let mut wire = registry.to_bytes(&panel(), 1).unwrap();
    let err = registry.decode::<Panel>(&mut wire, 1).unwrap_err();
    assert!(matches!(err, CodecError::NoAdapter { version: 1, .. }));
}

/// One tag byte (0 relay, 1 dimmer) ahead of the variant's record.
struct TaggedDevice;

impl TypeAdapter<Device> for TaggedDevice {
    fn read(&self, cx: &WireContext<'_>, src: &mut Bytes, field: &FieldSpec) -> wirebind_codec::Result<Option<Device>> {
        if !src.has_remaining() {
            return Ok(None);
        }
        let device = match src.get_u8() {
            0 => cx.read::<Relay>(src, field)?.map(Device::Relay),
            1 => cx.read::<Dimmer>(src, field)?.map(Device::Dimmer),
            tag => {
                return Err(CodecError::InvalidSchema(format!("unknown device tag {tag}")));
            }
        };
        Ok(device)
    }

    fn write(
        &self,
        cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&Device>,
        field: &FieldSpec,
    ) -> wirebind_codec::Result<()> {
        match value {
            Some(Device::Relay(relay)) => {
                dst.put_u8(0);
                cx.write(dst, Some(relay), field)
            }
            Some(Device::Dimmer(dimmer)) => {
                dst.put_u8(1);
                cx.write(dst, Some(dimmer), field)
            }
            None => Ok(()),
        }
    }
}

#[test]
fn custom_family_adapter_is_kept_over_variant_records() {
    let mut builder = builder();
    builder.register_adapter::<Device, _>(TaggedDevice);
    let registry = builder.build();

    let value = panel();
    let mut wire = registry.to_bytes(&value, 1).unwrap();
    assert_eq!(wire.as_ref(), &[7, 0, 1, 1, 50, 0x2C, 0x01]);
    assert_eq!(registry.decode::<Panel>(&mut wire, 1).unwrap(), Some(value));

    let id = registry.resolve(&TypeDesc::of::<Device>(), 1).unwrap();
    assert_eq!(registry.adapter(id).unwrap().kind(), AdapterKind::Custom);
}

/// Relay state as ASCII '0' / '1'.
struct AsciiRelay;

impl TypeAdapter<Relay> for AsciiRelay {
    fn read(&self, _cx: &WireContext<'_>, src: &mut Bytes, _field: &FieldSpec) -> wirebind_codec::Result<Option<Relay>> {
        if !src.has_remaining() {
            return Ok(None);
        }
        Ok(Some(Relay { on: src.get_u8() == b'1' }))
    }

    fn write(
        &self,
        _cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&Relay>,
        _field: &FieldSpec,
    ) -> wirebind_codec::Result<()> {
        let on = value.is_some_and(|relay| relay.on);
        dst.put_u8(if on { b'1' } else { b'0' });
        Ok(())
    }
}

#[test]
fn custom_variant_adapter_wins_over_generic_dispatch() {
    let mut builder = builder();
    builder.register_adapter::<Relay, _>(AsciiRelay);
    let registry = builder.build();

    let wire = registry.to_bytes(&panel(), 1).unwrap();
    assert_eq!(wire.as_ref(), &[7, b'1', 50, 0x2C, 0x01]);
}

#[test]
fn top_level_variant_dispatch() {
    let registry = builder().build();
    let device = Device::Dimmer(Dimmer {
        level: 1,
        ramp_ms: 2,
    });
    assert_eq!(registry.to_bytes(&device, 1).unwrap().as_ref(), &[1, 2, 0]);
}
