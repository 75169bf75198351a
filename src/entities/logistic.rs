//! Logistic record (hardware identity of a unit)

use serde::{Deserialize, Serialize};

/// Hardware, firmware and radio identity of one unit
///
/// Embedded in every station record under `LogisticData`. Persisted once per
/// PCBA number; later station passes reuse the stored row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LogisticRecord {
    #[serde(rename = "PCBANumber")]
    pub pcba_number: String,
    #[serde(rename = "ProductSN")]
    pub product_sn: String,
    pub part_number: String,
    #[serde(rename = "VPAppVersion")]
    pub vp_app_version: String,
    #[serde(rename = "VPBootLoaderVersion")]
    pub vp_boot_loader_version: String,
    #[serde(rename = "VPCoreVersion")]
    pub vp_core_version: String,
    pub supplier_hardware_version: String,
    pub manufacturer_hardware_version: String,
    pub manufacturer_software_version: String,
    pub ble_mac: String,
    #[serde(rename = "BleSN")]
    pub ble_sn: String,
    pub ble_version: String,
    // Field name as emitted by the station software.
    pub ble_passwork_key: String,
    #[serde(rename = "APAppVersion")]
    pub ap_app_version: String,
    #[serde(rename = "APKernelVersion")]
    pub ap_kernel_version: String,
    #[serde(rename = "TcuICCID")]
    pub tcu_iccid: String,
    pub phone_number: String,
    #[serde(rename = "IMEI")]
    pub imei: String,
    #[serde(rename = "IMSI")]
    pub imsi: String,
    pub production_date: String,
}

impl LogisticRecord {
    /// Unit identifier, if present
    pub fn unit_id(&self) -> Option<&str> {
        if self.pcba_number.is_empty() {
            None
        } else {
            Some(&self.pcba_number)
        }
    }

    /// True when every field is empty (the station log omitted the block)
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy with surrounding whitespace removed from every field
    pub fn trimmed(&self) -> Self {
        let t = |s: &String| s.trim().to_string();
        Self {
            pcba_number: t(&self.pcba_number),
            product_sn: t(&self.product_sn),
            part_number: t(&self.part_number),
            vp_app_version: t(&self.vp_app_version),
            vp_boot_loader_version: t(&self.vp_boot_loader_version),
            vp_core_version: t(&self.vp_core_version),
            supplier_hardware_version: t(&self.supplier_hardware_version),
            manufacturer_hardware_version: t(&self.manufacturer_hardware_version),
            manufacturer_software_version: t(&self.manufacturer_software_version),
            ble_mac: t(&self.ble_mac),
            ble_sn: t(&self.ble_sn),
            ble_version: t(&self.ble_version),
            ble_passwork_key: t(&self.ble_passwork_key),
            ap_app_version: t(&self.ap_app_version),
            ap_kernel_version: t(&self.ap_kernel_version),
            tcu_iccid: t(&self.tcu_iccid),
            phone_number: t(&self.phone_number),
            imei: t(&self.imei),
            imsi: t(&self.imsi),
            production_date: t(&self.production_date),
        }
    }
}
