//! Lookup tables consumed by the rules.
//!
//! Built-in data ships with the crate; `[tables]` in the config file is merged
//! over it. Rules receive the tables at construction and never read globals.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn pairs(items: &[(&str, &str)]) -> IndexMap<String, String> {
    items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTables {
    pub weekdays: Vec<String>,
    pub months: Vec<String>,
    pub seasons: Vec<String>,
    /// Units and currency signs that take a non-breaking space after a number
    pub units: Vec<String>,
    pub abbreviations: IndexMap<String, String>,
    pub acronyms: IndexMap<String, String>,
    /// Loanword and its native alternative
    pub loanwords: IndexMap<String, String>,
    pub adversatives: Vec<String>,
    pub redundancies: IndexMap<String, String>,
    pub vague_terms: IndexMap<String, String>,
    pub queismo: IndexMap<String, String>,
    pub dequeismo: IndexMap<String, String>,
    pub laismo: IndexMap<String, String>,
    pub loismo: IndexMap<String, String>,
    /// Forms of *ser* that introduce a periphrastic passive
    pub passive_auxiliaries: Vec<String>,
    /// Words ending like a participle that are not one
    pub passive_exclusions: Vec<String>,
    /// Words ending like a gerund that are not one
    pub gerund_exclusions: Vec<String>,
}

impl Default for RuleTables {
    fn default() -> Self {
        Self {
            weekdays: words(&[
                "lunes", "martes", "miércoles", "jueves", "viernes", "sábado", "domingo",
            ]),
            months: words(&[
                "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto",
                "septiembre", "octubre", "noviembre", "diciembre",
            ]),
            seasons: words(&["primavera", "verano", "otoño", "invierno"]),
            units: words(&[
                "%", "km", "kg", "m", "cm", "mm", "g", "mg", "l", "ml", "€", "$", "h", "s", "min",
                "Hz", "kHz", "MHz", "GB", "MB", "KB",
            ]),
            abbreviations: pairs(&[
                ("Sr", "Sr."),
                ("Sra", "Sra."),
                ("Srta", "Srta."),
                ("Dr", "Dr."),
                ("Dra", "Dra."),
                ("Ud", "Ud."),
                ("Uds", "Uds."),
                ("Vd", "Vd."),
                ("Vds", "Vds."),
                ("etc", "etc."),
                ("Etc", "Etc."),
                ("pág", "pág."),
                ("págs", "págs."),
                ("núm", "núm."),
                ("núms", "núms."),
                ("vol", "vol."),
                ("vols", "vols."),
                ("cap", "cap."),
                ("caps", "caps."),
                ("fig", "fig."),
                ("figs", "figs."),
                ("ej", "ej."),
                ("p ej", "p. ej."),
                ("vs", "vs."),
                ("aprox", "aprox."),
                ("máx", "máx."),
                ("mín", "mín."),
            ]),
            acronyms: pairs(&[
                ("O.N.U.", "ONU"),
                ("O.T.A.N.", "OTAN"),
                ("U.E.", "UE"),
                ("E.E.U.U.", "EE. UU."),
                ("EE.UU.", "EE. UU."),
                ("EEUU", "EE. UU."),
                ("CC.OO.", "CC. OO."),
                ("FF.AA.", "FF. AA."),
            ]),
            loanwords: pairs(&[
                ("software", "programa informático"),
                ("hardware", "equipo informático"),
                ("email", "correo electrónico"),
                ("e-mail", "correo electrónico"),
                ("online", "en línea"),
                ("on-line", "en línea"),
                ("offline", "sin conexión"),
                ("feedback", "retroalimentación"),
                ("marketing", "mercadotecnia"),
                ("manager", "gerente"),
                ("link", "enlace"),
                ("click", "clic"),
                ("smartphone", "teléfono inteligente"),
                ("laptop", "portátil"),
                ("backup", "copia de seguridad"),
                ("chat", "conversación"),
                ("post", "publicación"),
                ("hashtag", "etiqueta"),
                ("startup", "empresa emergente"),
                ("ranking", "clasificación"),
                ("hobby", "afición"),
                ("show", "espectáculo"),
                ("parking", "aparcamiento"),
                ("stop", "alto"),
                ("spray", "aerosol"),
                ("stock", "existencias"),
            ]),
            adversatives: words(&["pero", "aunque", "sino"]),
            redundancies: pairs(&[
                ("subir arriba", "subir"),
                ("bajar abajo", "bajar"),
                ("entrar adentro", "entrar"),
                ("salir afuera", "salir"),
                ("volver a repetir", "repetir"),
                ("totalmente gratis", "gratis"),
                ("completamente lleno", "lleno"),
                ("absolutamente necesario", "necesario"),
                ("muy óptimo", "óptimo"),
                ("bastante único", "único"),
                ("accidente fortuito", "accidente"),
                ("cita previa", "cita"),
                ("persona humana", "persona"),
                ("volar por el aire", "volar"),
                ("divisar a lo lejos", "divisar"),
                ("mendigo pobre", "mendigo"),
                ("protagonista principal", "protagonista"),
                ("túnel subterráneo", "túnel"),
                ("etc., etcétera", "etc."),
                ("lapso de tiempo", "lapso"),
                ("hemorragia de sangre", "hemorragia"),
                ("conclusión final", "conclusión"),
                ("prever de antemano", "prever"),
                ("aterido de frío", "aterido"),
                ("erario público", "erario"),
                ("falso pretexto", "pretexto"),
                ("nexo de unión", "nexo"),
                ("regalo gratis", "regalo"),
                ("utopía inalcanzable", "utopía"),
                ("vigente en la actualidad", "vigente"),
            ]),
            vague_terms: pairs(&[
                ("la cosa es que", "el asunto es que"),
                ("alguna cosa", "algo"),
                ("cualquier cosa", "cualquier elemento"),
                ("una cosa", "un término preciso"),
                ("las cosas", "un término preciso"),
                ("cosas", "un término preciso"),
            ]),
            queismo: pairs(&[
                ("me alegro que", "me alegro de que"),
                ("te alegras que", "te alegras de que"),
                ("se alegra que", "se alegra de que"),
                ("nos alegramos que", "nos alegramos de que"),
                ("me acuerdo que", "me acuerdo de que"),
                ("te acuerdas que", "te acuerdas de que"),
                ("me di cuenta que", "me di cuenta de que"),
                ("se dio cuenta que", "se dio cuenta de que"),
                ("me doy cuenta que", "me doy cuenta de que"),
                ("me olvidé que", "me olvidé de que"),
                ("se olvidó que", "se olvidó de que"),
                ("me olvido que", "me olvido de que"),
                ("me enteré que", "me enteré de que"),
                ("se enteró que", "se enteró de que"),
                ("me aseguré que", "me aseguré de que"),
                ("se aseguró que", "se aseguró de que"),
                ("estoy seguro que", "estoy seguro de que"),
                ("está seguro que", "está seguro de que"),
                ("no hay duda que", "no hay duda de que"),
                ("no cabe duda que", "no cabe duda de que"),
                ("a pesar que", "a pesar de que"),
                ("en caso que", "en caso de que"),
                ("con tal que", "con tal de que"),
                ("a fin que", "a fin de que"),
                ("a condición que", "a condición de que"),
            ]),
            dequeismo: pairs(&[
                ("pienso de que", "pienso que"),
                ("creo de que", "creo que"),
                ("opino de que", "opino que"),
                ("supongo de que", "supongo que"),
                ("imagino de que", "imagino que"),
                ("digo de que", "digo que"),
                ("dice de que", "dice que"),
                ("afirmo de que", "afirmo que"),
                ("afirma de que", "afirma que"),
                ("deseo de que", "deseo que"),
                ("espero de que", "espero que"),
                ("quiero de que", "quiero que"),
                ("sé de que", "sé que"),
                ("veo de que", "veo que"),
                ("me parece de que", "me parece que"),
                ("es seguro de que", "es seguro que"),
                ("es cierto de que", "es cierto que"),
                ("es verdad de que", "es verdad que"),
                ("es posible de que", "es posible que"),
                ("es probable de que", "es probable que"),
            ]),
            laismo: pairs(&[
                ("la dije", "le dije"),
                ("la dijeron", "le dijeron"),
                ("la di", "le di"),
                ("la dieron", "le dieron"),
                ("la pregunté", "le pregunté"),
                ("la preguntaron", "le preguntaron"),
                ("la conté", "le conté"),
                ("la contaron", "le contaron"),
                ("la expliqué", "le expliqué"),
                ("la explicaron", "le explicaron"),
                ("la hablé", "le hablé"),
                ("la hablaron", "le hablaron"),
                ("la pedí", "le pedí"),
                ("la pidieron", "le pidieron"),
                ("la contesté", "le contesté"),
                ("la respondí", "le respondí"),
            ]),
            loismo: pairs(&[
                ("lo dije", "le dije"),
                ("lo dijeron", "le dijeron"),
                ("lo di", "le di"),
                ("lo dieron", "le dieron"),
                ("lo pregunté", "le pregunté"),
                ("lo hablé", "le hablé"),
                ("lo conté", "le conté"),
                ("lo pedí", "le pedí"),
            ]),
            passive_auxiliaries: words(&[
                "es", "son", "era", "eran", "fue", "fueron", "será", "serán", "sería", "serían",
                "sea", "sean", "fuera", "fueran", "sido", "siendo", "ser",
            ]),
            passive_exclusions: words(&[
                "nada", "cada", "vida", "ida", "comida", "salida", "medida", "llegada", "entrada",
                "partida", "espada", "moneda", "seda", "boda", "todo", "nido", "ruido", "sonido",
                "sentido", "partido", "apellido", "marido", "contenido", "vestido", "estado",
                "pasado", "lado", "grado", "mercado", "cuidado", "soldado",
            ]),
            gerund_exclusions: words(&[
                "cuando", "mando", "bando", "blando", "comando", "fernando", "orlando", "armando",
                "rolando", "nefando", "ando", "estruendo", "remiendo", "allende", "duendo",
            ]),
        }
    }
}

/// `[tables]` configuration section, merged over [`RuleTables::default`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOverrides {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub abbreviations: IndexMap<String, String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub acronyms: IndexMap<String, String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub loanwords: IndexMap<String, String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub redundancies: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub passive_exclusions: Vec<String>,
}

fn extend_unique(target: &mut Vec<String>, extra: &[String]) {
    for item in extra {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

impl RuleTables {
    /// Built-in tables with configured entries added or overriding
    pub fn with_overrides(mut self, overrides: &TableOverrides) -> Self {
        extend_unique(&mut self.units, &overrides.units);
        extend_unique(&mut self.passive_exclusions, &overrides.passive_exclusions);
        for (target, extra) in [
            (&mut self.abbreviations, &overrides.abbreviations),
            (&mut self.acronyms, &overrides.acronyms),
            (&mut self.loanwords, &overrides.loanwords),
            (&mut self.redundancies, &overrides.redundancies),
        ] {
            target.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        self
    }

    /// Weekday, month and season names, lowercase
    pub fn calendar_words(&self) -> Vec<String> {
        self.weekdays.iter().chain(&self.months).chain(&self.seasons).cloned().collect()
    }
}
