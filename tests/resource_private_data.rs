mod harness;

use std::any::Any;
use std::sync::Arc;

use harness::{Harness, HEIGHT, WIDTH};
use pretty_assertions::assert_eq;
use wined3d_core::resources::{
    Format, Guid, IndexFormat, Pool, PrivateData, PrivateDataFlags, ResourceError, SurfaceDesc,
    TextureDesc, Usage,
};
use wined3d_core::runtime::{DeviceConfig, DeviceError};

const GUID: Guid = Guid(0x6d4f_0e5a_41c2_4bd9_9a3e_18f0_77c2_d001);
const OTHER: Guid = Guid(0x6d4f_0e5a_41c2_4bd9_9a3e_18f0_77c2_d002);

fn desc(format: Format) -> SurfaceDesc {
    SurfaceDesc {
        width: WIDTH,
        height: HEIGHT,
        format,
    }
}

#[test]
fn blob_private_data_round_trips() {
    let mut h = Harness::new();
    let rt = h.device.create_render_target(desc(Format::A8R8G8B8)).unwrap();
    let resource = rt.resource();

    resource.set_private_data(GUID, PrivateData::Blob(vec![1, 2, 3, 4]), PrivateDataFlags::empty());

    let mut size = 0;
    match resource.get_private_data(GUID, None, &mut size) {
        Err(ResourceError::MoreData { required }) => assert_eq!(required, 4),
        other => panic!("expected MoreData, got {other:?}"),
    }
    assert_eq!(size, 4);

    let mut small = [0u8; 2];
    let mut size = small.len();
    assert!(matches!(
        resource.get_private_data(GUID, Some(&mut small), &mut size),
        Err(ResourceError::MoreData { required: 4 })
    ));

    let mut out = [0u8; 8];
    let mut size = out.len();
    resource
        .get_private_data(GUID, Some(&mut out), &mut size)
        .unwrap();
    assert_eq!(size, 4);
    assert_eq!(&out[..4], &[1, 2, 3, 4]);
    assert_eq!(resource.private_data_flags(GUID), Some(PrivateDataFlags::empty()));
}

#[test]
fn missing_private_data_is_reported() {
    let mut h = Harness::new();
    let vb = h
        .device
        .create_vertex_buffer(64, Usage::empty(), Pool::Managed)
        .unwrap();
    let resource = vb.resource();

    let mut size = 0;
    assert!(matches!(
        resource.get_private_data(GUID, None, &mut size),
        Err(ResourceError::NotFound(g)) if g == GUID
    ));
    assert!(matches!(
        resource.free_private_data(GUID),
        Err(ResourceError::NotFound(_))
    ));

    resource.set_private_data(OTHER, PrivateData::Blob(vec![9]), PrivateDataFlags::empty());
    resource.free_private_data(OTHER).unwrap();
    assert!(resource.private_data_flags(OTHER).is_none());
}

#[test]
fn object_private_data_is_released_when_replaced() {
    let mut h = Harness::new();
    let ib = h
        .device
        .create_index_buffer(64, Usage::empty(), Pool::Default, IndexFormat::U16)
        .unwrap();
    let resource = ib.resource();
    let object: Arc<dyn Any + Send + Sync> = Arc::new(String::from("attached"));

    resource.set_private_data(
        GUID,
        PrivateData::Object(Arc::clone(&object)),
        PrivateDataFlags::empty(),
    );
    assert_eq!(Arc::strong_count(&object), 2);
    assert_eq!(
        resource.private_data_flags(GUID),
        Some(PrivateDataFlags::IUNKNOWN)
    );
    let fetched = resource.private_object(GUID).unwrap();
    assert_eq!(fetched.downcast_ref::<String>().map(String::as_str), Some("attached"));
    drop(fetched);

    resource.set_private_data(GUID, PrivateData::Blob(vec![0]), PrivateDataFlags::IUNKNOWN);
    assert_eq!(Arc::strong_count(&object), 1);
    assert_eq!(resource.private_data_flags(GUID), Some(PrivateDataFlags::empty()));
    assert!(matches!(
        resource.private_object(GUID),
        Err(ResourceError::NotAnObject(_))
    ));
}

#[test]
fn default_pool_allocations_respect_the_budget() {
    let mut h = Harness::with_config(DeviceConfig {
        video_memory_bytes: 64 * 1024,
        ..DeviceConfig::default()
    });
    // Front and back buffer of the implicit swapchain.
    assert_eq!(h.device.available_video_memory(), 32 * 1024);

    let a = h.device.create_render_target(desc(Format::X8R8G8B8)).unwrap();
    let _b = h.device.create_render_target(desc(Format::X8R8G8B8)).unwrap();
    assert_eq!(h.device.available_video_memory(), 0);

    match h.device.create_render_target(desc(Format::X8R8G8B8)) {
        Err(DeviceError::Resource(ResourceError::OutOfVideoMemory {
            requested,
            available,
        })) => {
            assert_eq!(requested, 16 * 1024);
            assert_eq!(available, 0);
        }
        other => panic!("expected out of video memory, got {other:?}"),
    }

    // Managed and system memory resources are not charged to the budget.
    h.device
        .create_offscreen_plain_surface(desc(Format::X8R8G8B8), Pool::SystemMem)
        .unwrap();
    h.device
        .create_texture(
            TextureDesc {
                width: WIDTH,
                height: HEIGHT,
                levels: 0,
                format: Format::A8R8G8B8,
            },
            Usage::empty(),
            Pool::Managed,
        )
        .unwrap();

    drop(a);
    assert_eq!(h.device.available_video_memory(), 16 * 1024);
    h.device.create_render_target(desc(Format::X8R8G8B8)).unwrap();
}

#[test]
fn priority_is_swapped() {
    let mut h = Harness::new();
    let texture = h
        .device
        .create_texture(
            TextureDesc {
                width: 16,
                height: 8,
                levels: 0,
                format: Format::A8R8G8B8,
            },
            Usage::empty(),
            Pool::Managed,
        )
        .unwrap();
    assert_eq!(texture.levels(), 5);

    let resource = texture.resource();
    assert_eq!(resource.set_priority(7), 0);
    assert_eq!(resource.set_priority(2), 7);
    assert_eq!(resource.priority(), 2);
}

#[test]
fn empty_resources_are_rejected() {
    let mut h = Harness::new();
    assert!(matches!(
        h.device.create_vertex_buffer(0, Usage::empty(), Pool::Default),
        Err(DeviceError::Resource(ResourceError::InvalidSize))
    ));
    assert!(matches!(
        h.device.create_render_target(SurfaceDesc {
            width: 0,
            height: 4,
            format: Format::X8R8G8B8,
        }),
        Err(DeviceError::Resource(ResourceError::InvalidSize))
    ));
}

#[test]
fn render_target_requires_render_target_usage() {
    let mut h = Harness::new();
    let plain = h
        .device
        .create_offscreen_plain_surface(desc(Format::X8R8G8B8), Pool::Default)
        .unwrap();
    assert!(matches!(
        h.device.set_render_target(plain),
        Err(DeviceError::NotARenderTarget)
    ));
}
